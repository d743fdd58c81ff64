//! `CorpusSource` over the LanceDB documents table.
use anyhow::{anyhow, Context, Result};
use arrow_array::{Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::Connection;
use tracing::{info, warn};

use recall_core::traits::CorpusSource;
use recall_core::types::{CorpusRecord, Document, Meta};

use crate::schema::STATUS_READY;
use crate::table::{open_db, sql_literal, table_exists};

pub struct LanceCorpusSource {
    db: Connection,
    table_name: String,
}

impl LanceCorpusSource {
    pub async fn open(uri: &str, table_name: &str) -> Result<Self> {
        Ok(Self::new(open_db(uri).await?, table_name))
    }

    pub fn new(db: Connection, table_name: &str) -> Self {
        Self { db, table_name: table_name.to_string() }
    }
}

impl CorpusSource for LanceCorpusSource {
    async fn load(&self, partition_id: &str) -> Result<Vec<CorpusRecord>> {
        if !table_exists(&self.db, &self.table_name).await? {
            info!(table = %self.table_name, "documents table does not exist yet");
            return Ok(Vec::new());
        }
        let table = self.db.open_table(&self.table_name).execute().await?;
        let filter = format!(
            "partition_id = {} AND embedding_status = {}",
            sql_literal(partition_id),
            sql_literal(STATUS_READY)
        );
        let mut stream = table.query().only_if(filter).execute().await?;

        let mut records = Vec::new();
        let mut skipped = 0usize;
        while let Some(batch) = stream.try_next().await? {
            read_batch(&batch, &mut records, &mut skipped)?;
        }
        if skipped > 0 {
            warn!(partition = partition_id, skipped, "skipped rows without a usable vector");
        }
        info!(partition = partition_id, rows = records.len(), "loaded partition from LanceDB");
        Ok(records)
    }
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| anyhow!("documents.{name} column missing or mistyped"))
}

/// Vectors are normally a fixed-size float list; older tables stored them as JSON text.
enum VectorColumn<'a> {
    Native(&'a FixedSizeListArray),
    Json(&'a StringArray),
}

impl VectorColumn<'_> {
    fn get(&self, i: usize) -> Result<Option<Vec<f32>>> {
        match self {
            Self::Native(col) => {
                if col.is_null(i) {
                    return Ok(None);
                }
                let values = col.value(i);
                let floats = values
                    .as_any()
                    .downcast_ref::<Float32Array>()
                    .ok_or_else(|| anyhow!("documents.vector items are not float32"))?;
                Ok(Some(floats.values().to_vec()))
            }
            Self::Json(col) => {
                if col.is_null(i) {
                    return Ok(None);
                }
                match CorpusRecord::vector_from_json(col.value(i)) {
                    Ok(v) => Ok(Some(v)),
                    Err(e) => {
                        warn!(error = %e, "unparseable vector text");
                        Ok(None)
                    }
                }
            }
        }
    }
}

fn read_batch(batch: &RecordBatch, out: &mut Vec<CorpusRecord>, skipped: &mut usize) -> Result<()> {
    let ids = column::<StringArray>(batch, "id")?;
    let groups = column::<StringArray>(batch, "group_id")?;
    let contents = column::<StringArray>(batch, "content")?;
    let order_keys = column::<Int64Array>(batch, "order_key").ok();
    let metadata = column::<StringArray>(batch, "metadata").ok();
    let vectors = match column::<FixedSizeListArray>(batch, "vector") {
        Ok(col) => VectorColumn::Native(col),
        Err(_) => VectorColumn::Json(column::<StringArray>(batch, "vector")?),
    };

    for i in 0..batch.num_rows() {
        let Some(vector) = vectors.get(i)?.filter(|v| !v.is_empty()) else {
            *skipped += 1;
            continue;
        };
        let id = ids.value(i);
        let mut doc = Document::new(id, contents.value(i), groups.value(i));
        doc.order_key = order_keys.filter(|c| !c.is_null(i)).map(|c| c.value(i));
        if let Some(col) = metadata.filter(|c| !c.is_null(i)) {
            doc.metadata = serde_json::from_str::<Meta>(col.value(i))
                .with_context(|| format!("metadata of {id} is not a JSON string map"))?;
        }
        out.push(CorpusRecord::new(doc, vector));
    }
    Ok(())
}

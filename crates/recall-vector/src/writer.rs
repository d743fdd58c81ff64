//! Ingestion-side writes into the documents table.
use anyhow::{bail, Context, Result};
use arrow_array::{
    FixedSizeListArray, Int64Array, RecordBatch, RecordBatchIterator, StringArray, TimestampMillisecondArray,
};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::Connection;
use std::sync::Arc;
use tracing::info;

use recall_core::types::CorpusRecord;

use crate::schema::{build_documents_schema, STATUS_PENDING, STATUS_READY};
use crate::table::{open_db, sql_literal, table_exists};

const BATCH_SIZE: usize = 1000;

fn staging_id(partition_id: &str) -> String {
    format!("__staging__:{partition_id}")
}

fn hash_content(s: &str) -> String {
    blake3::hash(s.as_bytes()).to_hex().to_string()
}

pub struct CorpusWriter {
    db: Connection,
    table_name: String,
    dim: i32,
    show_progress: bool,
}

impl CorpusWriter {
    pub async fn open(uri: &str, table_name: &str, dim: usize) -> Result<Self> {
        let db = open_db(uri).await?;
        Self::new(db, table_name, dim)
    }

    pub fn new(db: Connection, table_name: &str, dim: usize) -> Result<Self> {
        if dim == 0 {
            bail!("embedding dimension must be positive");
        }
        let dim = i32::try_from(dim).context("embedding dimension does not fit the vector column")?;
        Ok(Self { db, table_name: table_name.to_string(), dim, show_progress: false })
    }

    /// Render an indicatif progress bar while writing.
    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Swap the rows of `partition_id` for `records`.
    ///
    /// New rows are written under a staging partition id first; the old rows
    /// are only deleted once every batch landed. A failed write leaves the
    /// old partition untouched and the staged rows are cleared on the next run.
    pub async fn replace_partition(&self, partition_id: &str, records: &[CorpusRecord]) -> Result<usize> {
        let staging = staging_id(partition_id);
        self.delete_partition(&staging).await?;
        let written = self.append(&staging, records).await?;
        if !table_exists(&self.db, &self.table_name).await? {
            return Ok(written);
        }
        let table = self.db.open_table(&self.table_name).execute().await?;
        table.delete(&format!("partition_id = {}", sql_literal(partition_id))).await?;
        table
            .update()
            .only_if(format!("partition_id = {}", sql_literal(&staging)))
            .column("partition_id", sql_literal(partition_id))
            .execute()
            .await?;
        info!(partition = partition_id, rows = written, "partition replaced");
        Ok(written)
    }

    pub async fn delete_partition(&self, partition_id: &str) -> Result<()> {
        if table_exists(&self.db, &self.table_name).await? {
            let table = self.db.open_table(&self.table_name).execute().await?;
            table.delete(&format!("partition_id = {}", sql_literal(partition_id))).await?;
        }
        Ok(())
    }

    /// Append `records` to `partition_id`. Records with a vector are written
    /// `ready`; the rest are written `pending` and never served.
    pub async fn append(&self, partition_id: &str, records: &[CorpusRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let pb = if self.show_progress { ProgressBar::new(records.len() as u64) } else { ProgressBar::hidden() };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")?
                .progress_chars("#>-"),
        );
        pb.set_message(format!("writing partition {partition_id}"));

        let mut written = 0usize;
        for batch in records.chunks(BATCH_SIZE) {
            let rb = self.to_record_batch(partition_id, batch)?;
            self.insert_batch(rb).await?;
            written += batch.len();
            pb.set_position(written as u64);
        }
        pb.finish_with_message(format!("partition {partition_id} written"));
        info!(partition = partition_id, rows = written, table = %self.table_name, "wrote corpus rows");
        Ok(written)
    }

    async fn insert_batch(&self, rb: RecordBatch) -> Result<()> {
        let schema = rb.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(rb)].into_iter(), schema));
        if table_exists(&self.db, &self.table_name).await? {
            self.db.open_table(&self.table_name).execute().await?.add(reader).execute().await?;
        } else {
            self.db.create_table(&self.table_name, reader).execute().await?;
        }
        Ok(())
    }

    fn to_record_batch(&self, partition_id: &str, records: &[CorpusRecord]) -> Result<RecordBatch> {
        let now = Utc::now().timestamp_millis();
        let mut ids = Vec::with_capacity(records.len());
        let mut groups = Vec::with_capacity(records.len());
        let mut contents = Vec::with_capacity(records.len());
        let mut order_keys = Vec::with_capacity(records.len());
        let mut metadata = Vec::with_capacity(records.len());
        let mut statuses = Vec::with_capacity(records.len());
        let mut hashes = Vec::with_capacity(records.len());
        let mut embedded_at = Vec::with_capacity(records.len());
        let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(records.len());

        for record in records {
            let doc = &record.document;
            if let Some(v) = &record.vector {
                if i32::try_from(v.len()).ok() != Some(self.dim) {
                    bail!("vector for {} has {} dimensions, table expects {}", doc.id, v.len(), self.dim);
                }
            }
            ids.push(doc.id.clone());
            groups.push(doc.group_id.clone());
            contents.push(doc.text.clone());
            order_keys.push(doc.order_key);
            metadata.push(if doc.metadata.is_empty() { None } else { Some(serde_json::to_string(&doc.metadata)?) });
            hashes.push(hash_content(&doc.text));
            match &record.vector {
                Some(v) => {
                    statuses.push(STATUS_READY);
                    embedded_at.push(Some(now));
                    vectors.push(Some(v.iter().map(|&x| Some(x)).collect()));
                }
                None => {
                    statuses.push(STATUS_PENDING);
                    embedded_at.push(None);
                    vectors.push(None);
                }
            }
        }

        let rb = RecordBatch::try_new(
            build_documents_schema(self.dim),
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(StringArray::from(vec![partition_id; records.len()])),
                Arc::new(StringArray::from(groups)),
                Arc::new(StringArray::from(contents)),
                Arc::new(Int64Array::from(order_keys)),
                Arc::new(StringArray::from(metadata)),
                Arc::new(StringArray::from(statuses)),
                Arc::new(StringArray::from(hashes)),
                Arc::new(TimestampMillisecondArray::from(embedded_at)),
                Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(
                    vectors, self.dim,
                )),
            ],
        )?;
        Ok(rb)
    }
}

use recall_core::traits::Embedder;
use recall_embed::{default_embedder, EmbedderConfig, HashEmbedder};

#[tokio::test]
async fn hash_embedder_shapes_and_determinism() {
    let embedder = HashEmbedder::new(64).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).await.expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 64);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) {
        assert!((a - b).abs() <= 1e-6);
    }

    let q = embedder.embed_query("hello world").await.expect("embed_query");
    assert_eq!(&q, v1, "query and batch paths agree");
}

#[tokio::test]
async fn empty_text_embeds_to_zero_vector() {
    let embedder = HashEmbedder::new(8).expect("embedder");
    let v = embedder.embed_query("   ").await.expect("embed");
    assert!(v.iter().all(|x| *x == 0.0));
}

#[test]
fn zero_dimension_is_rejected() {
    assert!(HashEmbedder::new(0).is_err());
}

#[test]
fn hash_provider_is_selected_from_config() {
    let config = EmbedderConfig { provider: "hash".to_string(), dim: 16, ..EmbedderConfig::default() };
    let embedder = default_embedder(&config).expect("embedder");
    assert_eq!(embedder.dim(), 16);
}

#[test]
fn unknown_provider_is_an_error() {
    std::env::remove_var("APP_USE_FAKE_EMBEDDINGS");
    let config = EmbedderConfig { provider: "carrier-pigeon".to_string(), ..EmbedderConfig::default() };
    assert!(default_embedder(&config).is_err());
}

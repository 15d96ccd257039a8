use plagdet_core::config::Config;
use plagdet_core::traits::Embedder;
use plagdet_embed::{default_embedder, semantic_similarity};

fn main() -> anyhow::Result<()> {
    let settings = Config::load()?.settings()?;
    let embedder = default_embedder(&settings.embedding)?;
    let a = "The mitochondria is the powerhouse of the cell.";
    let b = "Cells get their energy from mitochondria.";
    println!("dim={} similarity={:.3}", embedder.dim(), semantic_similarity(a, b, embedder.as_ref()));
    Ok(())
}

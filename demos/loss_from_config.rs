// demos/loss_from_config.rs
// Picks losses from a JSON config and evaluates them on synthetic batches.
//
// Run with an optional config file holding a list of loss options:
//   cargo run --example loss_from_config -- losses.json

use losskit::nn::{Loss, LossModule, LossOptions, Module};
use losskit::{Reduction, Tensor};
use rand::SeedableRng;
use rand::rngs::StdRng;

const DEFAULT_CONFIG: &str = r#"[
    { "kind": "mse" },
    { "kind": "smooth_l1", "beta": 0.5, "reduction": "sum" },
    { "kind": "multi_margin", "p": 2, "weight": { "shape": [4], "data": [1.0, 1.0, 2.0, 2.0] } },
    { "kind": "triplet_margin", "margin": 0.5, "swap": true },
    { "kind": "cosine_embedding", "margin": 0.1, "reduction": "none" }
]"#;

const BATCH: usize = 8;
const FEATURES: usize = 4;

/// Synthetic inputs matching the arity of `loss`.
fn synthetic_inputs(loss: &LossModule<f64>, rng: &mut StdRng) -> Result<Vec<Tensor<f64>>, String> {
    let shape = [BATCH, FEATURES];
    let inputs = match loss.name() {
        "MultiMarginLoss" => {
            let labels: Vec<f64> = (0..BATCH).map(|i| (i % FEATURES) as f64).collect();
            vec![
                Tensor::randn_with_rng(&shape, &mut *rng),
                Tensor::from_vec(labels, &[BATCH]).map_err(|e| e.to_string())?,
            ]
        }
        "CosineEmbeddingLoss" => {
            let labels: Vec<f64> = (0..BATCH).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
            vec![
                Tensor::randn_with_rng(&shape, &mut *rng),
                Tensor::randn_with_rng(&shape, &mut *rng),
                Tensor::from_vec(labels, &[BATCH]).map_err(|e| e.to_string())?,
            ]
        }
        _ => (0..loss.arity())
            .map(|_| Tensor::randn_with_rng(&shape, &mut *rng))
            .collect(),
    };
    Ok(inputs)
}

fn main() -> Result<(), String> {
    println!("--- Loss Selection From Config Demo ---");

    let config = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path).map_err(|e| format!("{path}: {e}"))?,
        None => DEFAULT_CONFIG.to_string(),
    };
    let options: Vec<LossOptions<f64>> =
        serde_json::from_str(&config).map_err(|e| format!("Invalid loss config: {e}"))?;

    let mut rng = StdRng::seed_from_u64(42);
    for options in options {
        let loss = LossModule::new(options).map_err(|e| e.to_string())?;
        let inputs = synthetic_inputs(&loss, &mut rng)?;
        let refs: Vec<&Tensor<f64>> = inputs.iter().collect();
        let value = loss.forward(&refs).map_err(|e| e.to_string())?;

        println!("{loss}");
        println!("  buffers: {} element(s)", loss.buffer_element_count());
        match loss.reduction() {
            Reduction::None => println!("  per-sample: {:?}", value.to_vec()),
            _ => println!("  value: {:.6}", value.first().map_err(|e| e.to_string())?),
        }
    }

    Ok(())
}

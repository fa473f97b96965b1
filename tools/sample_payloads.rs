//! Sample Payload Generator
//!
//! Prints a JSON array of random house records, usable as a `/prever/batch`
//! body or split into single `/prever` requests.
//!
//! Usage: `sample-payloads [count] [invalid_rate] [seed]`

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

const REGIONS: &[&str] = &["norte", "sul", "centro", "leste", "oeste"];
const UNKNOWN_REGIONS: &[&str] = &["litoral", "serra", "interior"];
const PROPERTY_TYPES: &[&str] = &["casa", "apartamento", "sobrado"];
const CONDITIONS: &[&str] = &["novo", "bom", "reformar"];
const ANSWERS: &[&str] = &["sim", "não", "Sim", "nao", "SIM"];

/// House record matching the fields the service accepts
#[derive(Debug, Clone, Serialize)]
struct HouseRecord {
    tipo_imovel: String,
    area_m2: f64,
    quartos: u32,
    suites: u32,
    banheiros: u32,
    vagas_garagem: u32,
    regiao: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    condominio_valor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    iptu_mensal: Option<f64>,
    piscina: String,
    elevador: String,
    churrasqueira: String,
    pet_friendly: String,
    mobiliado: String,
    estado_conservacao: String,
}

/// Random house generator
struct HouseGenerator {
    rng: StdRng,
}

impl HouseGenerator {
    fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Generate a record the service should accept
    fn generate(&mut self) -> HouseRecord {
        let quartos = self.rng.gen_range(1..6);
        let area_m2 = (self.rng.gen_range(35.0..400.0_f64) * 10.0).round() / 10.0;

        HouseRecord {
            tipo_imovel: self.random_choice(PROPERTY_TYPES).to_string(),
            area_m2,
            quartos,
            suites: self.rng.gen_range(0..=quartos),
            banheiros: self.rng.gen_range(1..=quartos + 1),
            vagas_garagem: self.rng.gen_range(0..4),
            regiao: self.random_choice(REGIONS).to_string(),
            condominio_valor: self
                .rng
                .gen_bool(0.6)
                .then(|| self.rng.gen_range(150.0..1500.0_f64).round()),
            iptu_mensal: self
                .rng
                .gen_bool(0.8)
                .then(|| self.rng.gen_range(30.0..600.0_f64).round()),
            piscina: self.random_choice(ANSWERS).to_string(),
            elevador: self.random_choice(ANSWERS).to_string(),
            churrasqueira: self.random_choice(ANSWERS).to_string(),
            pet_friendly: self.random_choice(ANSWERS).to_string(),
            mobiliado: self.random_choice(ANSWERS).to_string(),
            estado_conservacao: self.random_choice(CONDITIONS).to_string(),
        }
    }

    /// Generate a record with a region the model was not trained on
    fn generate_invalid(&mut self) -> HouseRecord {
        let mut record = self.generate();
        record.regiao = self.random_choice(UNKNOWN_REGIONS).to_string();
        record
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

/// Share of invalid records, clamped to `[0, 1]`; unparsable or non-finite input means 0
fn parse_rate(arg: Option<&str>) -> f64 {
    arg.and_then(|s| s.parse::<f64>().ok())
        .filter(|r| r.is_finite())
        .unwrap_or(0.0)
        .clamp(0.0, 1.0)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_payloads=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let count: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(10);
    let invalid_rate = parse_rate(args.get(2).map(String::as_str));
    let seed: Option<u64> = args.get(3).and_then(|s| s.parse().ok());

    info!(
        count = count,
        invalid_rate = invalid_rate,
        seed = ?seed,
        "Generating sample payloads"
    );

    let mut generator = HouseGenerator::new(seed);
    let mut invalid = 0;
    let records: Vec<HouseRecord> = (0..count)
        .map(|_| {
            if generator.rng.gen_bool(invalid_rate) {
                invalid += 1;
                generator.generate_invalid()
            } else {
                generator.generate()
            }
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&records)?);

    info!(
        "Generated {} records ({} with unknown region)",
        records.len(),
        invalid
    );

    Ok(())
}

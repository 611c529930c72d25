//! Dealflow API Server binary
//!
//! HTTP REST API for report formulas.
//! Provides validate, evaluate, aggregate and calculated-fields endpoints.

use clap::Parser;
use dealflow_formula::api::{run_api_server, server::ApiConfig};

#[derive(Parser, Debug)]
#[command(name = "dealflow-server")]
#[command(version)]
#[command(author = "RoyalBit Inc. <admin@royalbit.ca>")]
#[command(about = "Dealflow API Server - HTTP REST API for report formulas")]
#[command(long_about = r#"
Dealflow API Server - HTTP REST API

Provides RESTful endpoints for report formulas:
  - POST /api/v1/validate           - Validate formula syntax before save
  - POST /api/v1/evaluate           - Evaluate a formula against one record
  - POST /api/v1/aggregate          - Reduce a formula across records
  - POST /api/v1/calculated-fields  - Evaluate calculated fields for a record

Additional endpoints:
  - GET  /health                    - Health check
  - GET  /version                   - Server version info
  - GET  /                          - API documentation

Example usage:
  dealflow-server                           # Start on localhost:8080
  dealflow-server --host 0.0.0.0 --port 3000

  curl -X POST http://localhost:8080/api/v1/evaluate \
    -H "Content-Type: application/json" \
    -d '{"formula": "expectedValue", "record": {"amount": 1000, "probability": 40}}'
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "DEALFLOW_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "DEALFLOW_PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    run_api_server(ApiConfig {
        host: args.host,
        port: args.port,
    })
    .await
}

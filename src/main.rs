//! # loandoc CLI
//!
//! Usage:
//!   loandoc template.json values.json -o letter.pdf
//!   loandoc template.json values.json -c config.json --png letter.png
//!   loandoc --example-template > template.json
//!   loandoc --example-values > values.json
//!
//! Log verbosity comes from `LOANDOC_LOG` (default `warn`).

use std::env;
use std::fs;
use std::process;

use loandoc::{DefaultAssetSource, FormValues, LoandocError, RenderConfig, Template};
use tracing_subscriber::EnvFilter;

struct Args {
    template: String,
    values: String,
    config: Option<String>,
    output: String,
    png: Option<String>,
}

fn flag_value(args: &[String], names: &[&str]) -> Option<String> {
    args.windows(2)
        .find(|w| names.contains(&w[0].as_str()))
        .map(|w| w[1].clone())
}

fn parse_args(args: &[String]) -> Option<Args> {
    // Positional arguments are those not consumed as a flag's value.
    let mut positional = Vec::new();
    let mut skip = false;
    for arg in args.iter().skip(1) {
        if skip {
            skip = false;
            continue;
        }
        if matches!(arg.as_str(), "-c" | "--config" | "-o" | "--output" | "--png") {
            skip = true;
            continue;
        }
        positional.push(arg.clone());
    }
    let mut positional = positional.into_iter();
    Some(Args {
        template: positional.next()?,
        values: positional.next()?,
        config: flag_value(args, &["-c", "--config"]),
        output: flag_value(args, &["-o", "--output"]).unwrap_or_else(|| "output.pdf".to_string()),
        png: flag_value(args, &["--png"]),
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("LOANDOC_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example-template") {
        print!("{}", example_template_json());
        return;
    }
    if args.iter().any(|a| a == "--example-values") {
        print!("{}", example_values_json());
        return;
    }

    let Some(args) = parse_args(&args) else {
        eprintln!("usage: loandoc <template.json> <values.json> [-c config.json] [-o output.pdf] [--png page.png]");
        process::exit(2);
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to start runtime: {}", e);
            process::exit(1);
        }
    };

    match runtime.block_on(run(&args)) {
        Ok(written) => eprintln!("✓ Written {} bytes to {}", written, args.output),
        Err(e) => {
            eprintln!("✗ Failed to generate document: {}", e);
            process::exit(1);
        }
    }
}

async fn run(args: &Args) -> Result<usize, LoandocError> {
    let template: Template = serde_json::from_str(&fs::read_to_string(&args.template)?)?;
    let values: FormValues = serde_json::from_str(&fs::read_to_string(&args.values)?)?;
    let config = match &args.config {
        Some(path) => RenderConfig::from_json(&fs::read_to_string(path)?)?,
        None => RenderConfig::default(),
    };
    let values = values.with_computed_emi();
    let assets = DefaultAssetSource::new();

    let page = loandoc::render_page(&template, &values, &config, &assets).await?;
    if let Some(png) = &args.png {
        page.image.save(png)?;
        eprintln!("✓ Page image written to {}", png);
    }

    let document = loandoc::document_from_page(&template, &page, &config)?;
    fs::write(&args.output, &document.bytes)?;
    Ok(document.bytes.len())
}

fn example_template_json() -> &'static str {
    r##"{
  "name": "Loan Approval Letter",
  "headline": "Loan Approval Letter",
  "body": "Dear {{name}},\n\nWe are pleased to inform you that your loan application has been approved.\n\nApplication No: {{custom:Application No}}\n\nLOAN DETAILS\nLoan Amount: ₹{{loanAmount}}\nInterest Rate: {{interestRate}}% p.a.\nTenure: {{tenure}} years\nMonthly EMI: ₹{{monthlyEmi}}\nProcessing Charge: ₹{{processingCharge}}\n\nBank Details\nAccount Number: {{accountNumber}}\nIFSC Code: {{ifscCode}}\nUPI ID: {{upiId}}\n\nTerms and Conditions\n• The sanction is valid for 30 days from the date of this letter.\n• EMIs are debited on the 5th of every month.\nThe processing charge is non-refundable once the loan is disbursed.\n\nRegards,\nCredit Operations",
  "watermark": {
    "text": "APPROVED",
    "opacity": 0.08,
    "size": 96,
    "rotation": -45,
    "color": "#1a4d8f"
  },
  "seal": {
    "image": "",
    "size": 110,
    "position": "bottom-left",
    "opacity": 90
  },
  "signature": {
    "image": "",
    "size": 140,
    "position": "bottom-right",
    "opacity": 100
  }
}
"##
}

fn example_values_json() -> &'static str {
    r##"{
  "name": "Asha Verma",
  "loanAmount": 500000,
  "interestRate": 8.5,
  "tenure": 5,
  "processingCharge": 2500,
  "accountNumber": "50100234567890",
  "ifscCode": "HDFC0001234",
  "upiId": "asha@okhdfc",
  "customFields": [
    { "key": "Application No", "value": "APP-2026-0142" }
  ]
}
"##
}

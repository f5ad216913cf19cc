//! Parse and prompt command implementations

use anyhow::Result;
use dompet_core::render;
use dompet_core::{build_prompt, Config, Outcome, TransactionPipeline, TransactionRecord};

use super::http_client;

/// What `dompet parse` ended with
#[derive(Debug, PartialEq)]
pub enum ParseReport {
    /// Dry run: the record that would be saved
    Parsed(TransactionRecord),
    /// A terminal pipeline outcome (any failure, or the result of `--save`)
    Finished(Outcome),
}

/// Run a description through the model
///
/// Without `save` nothing is written to the spreadsheet. With it the full
/// pipeline runs as the authorized user, exactly as a chat message would.
pub async fn run_parse(config: &Config, text: &str, save: bool) -> ParseReport {
    let pipeline = TransactionPipeline::from_config(config, http_client());

    if save {
        return ParseReport::Finished(pipeline.process(text, config.authorized_user_id).await);
    }

    match pipeline.interpret(text).await {
        Ok(record) => ParseReport::Parsed(record),
        Err(outcome) => ParseReport::Finished(outcome),
    }
}

pub async fn cmd_parse(config: &Config, text: &str, save: bool, json: bool) -> Result<()> {
    match run_parse(config, text, save).await {
        ParseReport::Parsed(record) => {
            print_record(&record, json)?;
            if !json {
                println!("\n(dry run, use --save to record it)");
            }
        }
        ParseReport::Finished(outcome) => {
            if let Outcome::PersistedOk(record) | Outcome::PersistedFailed(record) = &outcome {
                print_record(record, json)?;
            }
            println!("{}", render::outcome(&outcome).text);
        }
    }

    Ok(())
}

fn print_record(record: &TransactionRecord, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }

    println!("  Type:           {}", record.transaction_type);
    println!("  Amount:         Rp{}", record.amount);
    println!("  Description:    {}", record.description_label());
    println!(
        "  Payment method: {}",
        record.payment_method.as_deref().unwrap_or("N/A")
    );
    println!("  Category:       {}", record.category_label());
    Ok(())
}

/// Print the rendered parsing prompt
pub fn cmd_prompt(text: &str) -> Result<()> {
    println!("{}", build_prompt(text));
    Ok(())
}

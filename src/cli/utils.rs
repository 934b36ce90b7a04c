use std::io::{self, BufRead, Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::cli::OutputFormat;
use crate::error::ClientError;
use crate::views::TablePage;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = Map::new();
            response.insert("success".into(), json!(true));
            response.insert("message".into(), json!(message));
            if let Some(Value::Object(extra)) = data {
                response.extend(extra);
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(
    output_format: &OutputFormat,
    message: &str,
    error: Option<&ClientError>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let response = error_body(message, error);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

fn error_body(message: &str, error: Option<&ClientError>) -> Value {
    let mut response = json!({
        "success": false,
        "error": message
    });

    if let Some(error) = error {
        response["error_code"] = json!(error.error_code());
        if let Some(status) = error.status_code() {
            response["status"] = json!(status);
        }
    }
    response
}

/// Output a rendered table page
pub fn output_page(output_format: &OutputFormat, page: &TablePage) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(page)?),
        OutputFormat::Text => print!("{}", page),
    }
    Ok(())
}

/// Output a single record; text format lists its fields one per line
pub fn output_record<T: Serialize>(output_format: &OutputFormat, record: &T) -> anyhow::Result<()> {
    let value = serde_json::to_value(record)?;
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&value)?),
        OutputFormat::Text => match value {
            Value::Object(fields) => {
                for (name, field) in fields {
                    let shown = match field {
                        Value::Null => "-".to_string(),
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    println!("{:<24} {}", format!("{}:", name), shown);
                }
            }
            other => println!("{}", other),
        },
    }
    Ok(())
}

/// Read a JSON payload from stdin
pub fn read_stdin_json<T: DeserializeOwned>() -> anyhow::Result<T> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    if input.trim().is_empty() {
        return Err(anyhow::anyhow!("Expected a JSON object on stdin"));
    }
    serde_json::from_str(&input).map_err(|e| anyhow::anyhow!("Invalid JSON on stdin: {}", e))
}

/// Use the given password or ask for one on the terminal
pub fn password_or_prompt(password: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(anyhow::anyhow!("Password is required"));
    }
    Ok(password)
}

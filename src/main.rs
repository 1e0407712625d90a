mod app;
mod config;
mod document;
mod error;
mod export;
mod form;
mod items;
mod logo;
mod model;
mod platform;
mod totals;
mod view;

use clap::{Parser, Subcommand};
use comfy_table::{Attribute, Cell, CellAlignment, Table};
use eframe::egui;
use inquire::{Select, Text};
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::{Settings, default_settings_path};
use crate::document::InvoiceDocument;
use crate::error::{AppError, Result};
use crate::form::{InvoiceForm, coerce_decimal};
use crate::model::{CURRENCIES, format_money};

#[derive(Parser)]
#[command(name = "invoice-generator", version, about = "Create, preview and export invoices")]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure output folder, currency and tax defaults
    Config,
    /// List supported currencies
    Currencies,
    /// Write the default invoice as a PDF without opening the window
    Export {
        /// Invoice number (defaults to 001)
        #[arg(long)]
        number: Option<String>,
        /// Output folder (defaults to the configured one)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("❌ Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings_path = cli.settings.unwrap_or_else(default_settings_path);

    match cli.command {
        None => {
            let settings = Settings::load_or_init(&settings_path)?;
            run_gui(settings)
        }
        Some(Commands::Config) => {
            setup_config_wizard(&settings_path)?;
            Ok(())
        }
        Some(Commands::Currencies) => {
            let settings = Settings::load(&settings_path)?;
            show_currencies(&settings);
            Ok(())
        }
        Some(Commands::Export { number, out }) => {
            let settings = Settings::load(&settings_path)?;
            export_headless(&settings, number, out)
        }
    }
}

fn run_gui(settings: Settings) -> Result<()> {
    info!("Starting invoice window, output folder {:?}", settings.output_path());
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([980.0, 900.0])
            .with_title("Invoice Generator"),
        ..Default::default()
    };

    eframe::run_native(
        "invoice-generator",
        options,
        Box::new(move |cc| Ok(Box::new(app::InvoiceApp::new(cc, settings)))),
    )
    .map_err(|e| AppError::Gui(e.to_string()))
}

fn setup_config_wizard(path: &std::path::Path) -> Result<Settings> {
    println!("\n⚙️  --- Configuration Setup ---");
    let current = Settings::load(path)?;

    println!("📂 Opening folder picker...");
    let picked = rfd::FileDialog::new()
        .set_title("Select Output Folder for PDFs")
        .pick_folder();

    let output_dir = match picked {
        Some(dir) => dir.to_string_lossy().to_string(),
        None => {
            println!("❌ No folder selected. Falling back to manual input.");
            Text::new("Output Folder:")
                .with_default(&current.output_dir)
                .prompt()?
        }
    };

    let labels: Vec<String> = CURRENCIES.iter().map(|c| c.label()).collect();
    let start = CURRENCIES
        .iter()
        .position(|c| c.symbol == current.currency)
        .unwrap_or(0);
    let choice = Select::new("Default Currency:", labels.clone())
        .with_starting_cursor(start)
        .prompt()?;
    let currency = labels
        .iter()
        .position(|l| *l == choice)
        .map(|i| CURRENCIES[i].symbol.to_string())
        .unwrap_or_else(|| current.currency.clone());

    let tax_text = Text::new("Default Tax %:")
        .with_default(&current.tax_percent.to_string())
        .prompt()?;

    let settings = Settings {
        output_dir,
        currency,
        tax_percent: coerce_decimal(&tax_text),
        ..current
    };
    settings.save(path)?;
    println!("✅ Settings saved to {:?}", path);
    Ok(settings)
}

fn show_currencies(settings: &Settings) {
    let mut table = Table::new();
    table.set_header(vec![Cell::new("Symbol"), Cell::new("Code"), Cell::new("")]);
    for currency in CURRENCIES {
        let marker = if currency.symbol == settings.currency { "default" } else { "" };
        table.add_row(vec![
            Cell::new(currency.symbol),
            Cell::new(currency.code),
            Cell::new(marker).add_attribute(Attribute::Italic),
        ]);
    }
    println!("{table}");
}

fn export_headless(settings: &Settings, number: Option<String>, out: Option<PathBuf>) -> Result<()> {
    let mut form = InvoiceForm::new(settings);
    if let Some(number) = number {
        form.meta.number = number;
    }
    let out_dir = out.unwrap_or_else(|| settings.output_path());
    let doc = InvoiceDocument::from_form(&form);
    let path = export::pdf::write_invoice_pdf(&doc, &out_dir)?;

    let currency = form.meta.currency.as_str();
    let totals = form.totals();
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Description"),
        Cell::new("Qty"),
        Cell::new("Rate"),
        Cell::new("Amount"),
    ]);
    for item in form.items().iter() {
        table.add_row(vec![
            Cell::new(&item.description),
            Cell::new(item.quantity).set_alignment(CellAlignment::Right),
            Cell::new(format_money(currency, item.rate)).set_alignment(CellAlignment::Right),
            Cell::new(format_money(currency, item.amount)).set_alignment(CellAlignment::Right),
        ]);
    }
    for (label, value) in [
        ("Subtotal".to_string(), totals.subtotal),
        (format!("Tax ({}%)", form.meta.tax_percent), totals.tax_amount),
        ("Total".to_string(), totals.total),
    ] {
        table.add_row(vec![
            Cell::new(label).add_attribute(Attribute::Bold),
            Cell::new(""),
            Cell::new(""),
            Cell::new(format_money(currency, value))
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Bold),
        ]);
    }

    println!("{table}");
    println!("✅ PDF Generated: {:?}", path);
    Ok(())
}

//! Catalog command - inspect or validate the template catalog.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

/// Arguments for the catalog command.
#[derive(Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    command: CatalogCommand,

    /// Template catalog file (default: embedded catalog)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
enum CatalogCommand {
    /// List categories and entries
    Show,

    /// Run structural validation
    Check,
}

pub async fn run(args: CatalogArgs) -> anyhow::Result<()> {
    let catalog = super::load_catalog(args.catalog.as_deref())?;

    match args.command {
        CatalogCommand::Show => {
            println!(
                "{} {} entries in {} categories",
                style("ℹ").blue(),
                catalog.len(),
                catalog.categories().len()
            );

            for category in catalog.categories() {
                println!("\n{}", style(category).bold());
                for entry in catalog.entries().iter().filter(|e| e.category == category) {
                    println!(
                        "  {:<32} [{}] {}",
                        entry.field.key,
                        entry.field.control.type_name(),
                        entry.field.title
                    );
                }
            }

            let alias_count = catalog.aliases().count();
            println!("\n{} alias phrases", alias_count);
            Ok(())
        }
        CatalogCommand::Check => {
            let issues = catalog.validate();
            if issues.is_empty() {
                println!(
                    "{} Catalog OK: {} entries, {} aliases",
                    style("✓").green(),
                    catalog.len(),
                    catalog.aliases().count()
                );
                Ok(())
            } else {
                println!("{}", style("Catalog issues:").yellow());
                for issue in &issues {
                    println!("  - {}", issue);
                }
                anyhow::bail!("{} issue(s) found", issues.len());
            }
        }
    }
}

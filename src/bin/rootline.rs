use anyhow::Result;
use clap::{Parser, Subcommand};
use rootline::*;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::Level;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default $HOME/.rootline/rootline.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// Print debug information
    #[clap(long)]
    debug: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all trees with their health, including unregistered files
    List {
        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Create a new tree and initialize its database file
    Create {
        /// Display name of the new tree
        name: String,

        /// Optional description
        #[clap(short, long)]
        description: Option<String>,
    },

    /// Update a tree's name or description
    Update {
        /// Tree id
        tree_id: String,

        /// New display name
        #[clap(long)]
        name: Option<String>,

        /// New description
        #[clap(long)]
        description: Option<String>,
    },

    /// Delete a tree: its database file and its registry entry
    Delete {
        /// Tree id
        tree_id: String,
    },

    /// Diagnose registry/filesystem drift and optionally repair it
    Doctor {
        /// Remove registry entries whose files are missing
        #[clap(long)]
        prune: bool,
    },

    /// Register an existing database file as a tree
    Adopt {
        /// File path relative to the data directory, e.g. trees/smith.db
        file_path: String,

        /// Display name for the adopted tree
        name: String,

        /// Optional description
        #[clap(short, long)]
        description: Option<String>,
    },

    /// Print the resolved configuration
    Config,
}

#[derive(Tabled)]
struct TreeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Created")]
    created: String,
}

fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if cli.debug {
        tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();
    }

    if let Err(e) = run(&cli) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = RootlineConfig::new(&cli.config)?;

    if let Commands::Config = &cli.command {
        println!("{}", config.summary());
        println!("Config File:     {}", RootlineConfig::config_file_path());
        return Ok(());
    }

    let store = RootlineStore::open(config.layout())?;

    match &cli.command {
        Commands::List { json } => {
            let inventory = store.lifecycle().tree_inventory()?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&inventory)?);
                return Ok(());
            }

            let mut rows: Vec<TreeRow> = inventory
                .trees
                .iter()
                .map(|tree| TreeRow {
                    id: tree.record.id.clone(),
                    name: tree.record.name.clone(),
                    status: tree.health.to_string(),
                    path: tree.record.file_path.clone(),
                    created: tree.record.created_at.format("%Y-%m-%d").to_string(),
                })
                .collect();
            for stray in &inventory.unregistered {
                rows.push(TreeRow {
                    id: "-".to_string(),
                    name: "-".to_string(),
                    status: "unregistered".to_string(),
                    path: stray.clone(),
                    created: "-".to_string(),
                });
            }

            if rows.is_empty() {
                println!("no trees found");
            } else {
                println!("{}", Table::new(rows).with(Style::rounded()));
            }
        }
        Commands::Create { name, description } => {
            let mut input = CreateTreeInput::new(name);
            input.description = description.clone();
            let record = store.lifecycle().create_new_tree(&input)?;
            println!("created tree {} at {}", record.id, record.file_path);
        }
        Commands::Update {
            tree_id,
            name,
            description,
        } => {
            let record = store.lifecycle().update_tree(
                tree_id,
                &UpdateTreeInput {
                    name: name.clone(),
                    description: description.clone(),
                },
            )?;
            println!("updated tree {}: {}", record.id, record.name);
        }
        Commands::Delete { tree_id } => {
            store.lifecycle().delete_complete_tree(tree_id)?;
            println!("deleted tree {tree_id}");
        }
        Commands::Doctor { prune } => {
            let inventory = store.lifecycle().tree_inventory()?;

            let orphans: Vec<_> = inventory
                .trees
                .iter()
                .filter(|t| t.health == TreeHealth::Orphaned)
                .collect();

            if orphans.is_empty() && inventory.unregistered.is_empty() {
                println!("registry and filesystem are consistent");
                return Ok(());
            }

            for orphan in &orphans {
                if *prune {
                    store.lifecycle().remove_orphaned_tree(&orphan.record.id)?;
                    println!(
                        "pruned orphaned tree {} ({})",
                        orphan.record.id, orphan.record.name
                    );
                } else {
                    println!(
                        "orphaned: tree {} ({}) has no file at {}",
                        orphan.record.id, orphan.record.name, orphan.record.file_path
                    );
                }
            }
            for stray in &inventory.unregistered {
                println!("unregistered: {stray} (adopt with `rootline adopt {stray} <name>`)");
            }
            if !*prune && !orphans.is_empty() {
                println!("re-run with --prune to remove orphaned registry entries");
            }
        }
        Commands::Adopt {
            file_path,
            name,
            description,
        } => {
            let record = store.lifecycle().register_unregistered_file(
                file_path,
                name,
                description.as_deref(),
            )?;
            println!("adopted {} as tree {}", record.file_path, record.id);
        }
        // handled before the store is opened
        Commands::Config => {}
    }

    Ok(())
}

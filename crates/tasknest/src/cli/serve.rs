use anyhow::Result;
use clap::Parser;
use console::style;
use tasknest::TaskNest;
use tasknest_core::config::TaskNestConfig;

/// Run the HTTP server.
#[derive(Parser)]
pub struct ServeCommand {
    /// Port to listen on (overrides config).
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    pub host: Option<String>,

    /// Directory of additional SQL migrations.
    #[arg(long)]
    pub migrations_dir: Option<String>,
}

impl ServeCommand {
    pub async fn execute(self, mut config: TaskNestConfig) -> Result<()> {
        if let Some(port) = self.port {
            config.gateway.port = port;
        }
        if let Some(host) = self.host {
            config.gateway.host = host;
        }

        println!();
        println!(
            "  {} v{}",
            style("TaskNest").bold().cyan(),
            env!("CARGO_PKG_VERSION")
        );
        println!(
            "  {} http://{}:{}",
            style("Listening on").dim(),
            config.gateway.host,
            config.gateway.port
        );
        println!(
            "  {} {}",
            style("Store").dim(),
            if config.database.is_postgres() {
                "postgres"
            } else {
                "memory"
            }
        );
        println!();

        let mut builder = TaskNest::builder().config(config);
        if let Some(dir) = self.migrations_dir {
            builder = builder.migrations_dir(dir);
        }
        builder.build()?.run().await?;

        println!("\n  {}", style("Goodbye!").bold());
        Ok(())
    }
}

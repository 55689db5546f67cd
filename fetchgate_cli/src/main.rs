use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use fetchgate_core::download::{download, download_client};
use fetchgate_core::vcs::git::GitEngine;
use fetchgate_core::vcs::pipeline::clone_and_archive;

mod progress;
use progress::PercentBar;

#[derive(Parser)]
#[command(name = "fetchgate", about = "Remote-resource retrieval gateway")]
struct Args {
    /// URL of a file to download
    #[arg(short, long, conflicts_with = "clone")]
    url: Option<String>,

    /// URL of a repository to clone and archive
    #[arg(short, long)]
    clone: Option<String>,

    /// Base directory for working copies and produced files
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();
    let start = Instant::now();

    let result = match (args.url, args.clone) {
        (Some(url), None) => {
            println!("Downloading: {}", url);
            let client = download_client();
            let bar = PercentBar::new("downloading");
            let result = download(&client, &url, &args.dir, |pct| bar.tick(pct)).await;
            match &result {
                Ok(_) => bar.finish(),
                Err(_) => bar.abandon(),
            }
            result
        }
        (None, Some(url)) => {
            println!("Cloning: {}", url);
            let bar = PercentBar::new("checking out");
            let result = clone_and_archive(
                &GitEngine,
                &url,
                &args.dir.join("repos"),
                &args.dir.join("archives"),
                |pct| bar.tick(pct),
            )
            .await;
            match &result {
                Ok(_) => bar.finish(),
                Err(_) => bar.abandon(),
            }
            result
        }
        _ => {
            eprintln!("Pass exactly one of --url or --clone");
            std::process::exit(2);
        }
    };

    match result {
        Ok(name) => {
            println!("Produced {} in {:.2}s", name, start.elapsed().as_secs_f64());
        }
        Err(e) => {
            eprintln!("Failed: {}", e);
            std::process::exit(1);
        }
    }
}

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use homedir::my_home;
use tracing_subscriber::EnvFilter;

use noderag::config::Config;
use noderag::dom::NodeId;
use noderag::retriever::{Backend, ContextualRetriever};

mod cli;

fn base_path() -> anyhow::Result<PathBuf> {
    if let Ok(path) = std::env::var("NODERAG_BASE_PATH") {
        return Ok(PathBuf::from(path));
    }

    let home = my_home()
        .map_err(|e| anyhow::anyhow!("could not determine home directory: {e:?}"))?
        .context("home directory path is empty")?;
    Ok(home.join(".local/share/noderag"))
}

fn read_markup(file: &Path) -> anyhow::Result<Vec<u8>> {
    if file.as_os_str() == "-" {
        let mut buf = vec![];
        std::io::stdin().read_to_end(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("noderag=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();
    let config = Config::load_with(&base_path()?)?;
    let builder = config.parser.builder();

    match args.command {
        cli::Command::Nodes {
            file,
            interactive,
            depth,
        } => {
            let graph = builder.build_bytes(&read_markup(&file)?)?;

            let output = if interactive {
                let depth = depth.unwrap_or(config.retriever.context_depth);
                serde_json::to_string_pretty(&graph.rag_index(depth))?
            } else {
                serde_json::to_string_pretty(&graph.sorted())?
            };
            println!("{output}");
            Ok(())
        }

        cli::Command::Context { file, id, depth } => {
            let graph = builder.build_bytes(&read_markup(&file)?)?;
            let id = NodeId::from(id);
            if !graph.contains(&id) {
                anyhow::bail!("node `{id}` not found");
            }

            let depth = depth.unwrap_or(config.retriever.context_depth);
            println!("{}", graph.context(&id, depth));
            Ok(())
        }

        cli::Command::Query {
            file,
            query,
            top_k,
            threshold,
            model,
        } => {
            let _span = tracing::info_span!("query", file = %file.display()).entered();

            let graph = builder.build_bytes(&read_markup(&file)?)?;
            let model = model.unwrap_or_else(|| config.retriever.model.clone());
            let backend = Backend::load(&model, config.base_path().to_path_buf())?;

            let mut retriever = ContextualRetriever::new(backend)
                .with_builder(builder)
                .with_context_depth(config.retriever.context_depth);
            retriever.index_graph(graph)?;

            let hits = retriever.hits(
                &query,
                top_k.unwrap_or(config.retriever.top_k),
                threshold.unwrap_or(config.retriever.threshold),
            )?;

            if hits.is_empty() {
                tracing::info!("no node matched the query");
            }
            for hit in &hits {
                tracing::debug!(node = %hit.node_id, match_type = %hit.match_type, score = hit.score, "ranked node");
            }
            println!("{}", serde_json::to_string_pretty(&hits)?);
            Ok(())
        }
    }
}

mod cli;

use clap::Parser;
use cli::{Args, Commands};
use scanslate_cli::{client_config, run_export, run_ocr, ExportOptions, OcrOptions, RunSummary};
use scanslate_core::ServiceMode;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
  let default_filter = if verbose {
    "scanslate=debug,scanslate_cli=debug,scanslate_core=debug"
  } else {
    "scanslate=info,scanslate_cli=info,scanslate_core=info"
  };

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
    )
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}

#[tokio::main]
async fn main() {
  let args = Args::parse();
  init_tracing(args.verbose);

  let result = match args.command {
    Commands::Version => {
      println!("scanslate {}", env!("CARGO_PKG_VERSION"));
      return;
    }
    Commands::Ocr {
      inputs,
      paste,
      api_key,
      mode,
      contract,
      export,
      output_dir,
      markdown_out,
      json,
    } => {
      let options = OcrOptions {
        config: client_config(
          mode.into(),
          contract.map(Into::into),
          &args.service.base_url,
          args.service.timeout_secs,
        ),
        inputs,
        paste,
        api_key,
        exports: export.into_iter().map(Into::into).collect(),
        output_dir,
        markdown_out,
        json,
      };
      run_ocr(options).await
    }
    Commands::Export {
      markdown,
      image,
      format,
      contract,
      output_dir,
    } => {
      let options = ExportOptions {
        config: client_config(
          ServiceMode::Markdown,
          Some(contract.into()),
          &args.service.base_url,
          args.service.timeout_secs,
        ),
        markdown,
        images: image,
        formats: format.into_iter().map(Into::into).collect(),
        output_dir,
      };
      run_export(options).await
    }
  };

  match result {
    Ok(RunSummary { failures: 0, .. }) => {}
    Ok(summary) => {
      eprintln!("{} operation(s) failed", summary.failures);
      std::process::exit(1);
    }
    Err(e) => {
      eprintln!("Error: {:#}", e);
      std::process::exit(1);
    }
  }
}

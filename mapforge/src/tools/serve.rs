use anyhow::Result;
use mapforge::{config::Config, export::Exporter, server::MapServer};
use std::path::PathBuf;
use tokio::time::{Duration, sleep};

#[derive(clap::Args, Debug)]
#[command(disable_version_flag = true, verbatim_doc_comment)]
pub struct Subcommand {
	/// Path to a configuration file (YAML format) to configure the server, CORS, Overpass,
	/// rendering and basemaps. Run "mapforge help config" for all options.
	/// Command line arguments will override configuration file settings.
	#[arg(short = 'c', long, value_name = "FILE", display_order = 0, verbatim_doc_comment)]
	pub config: Option<PathBuf>,

	/// Serve via socket ip. Default: 0.0.0.0
	#[arg(short = 'i', long, display_order = 0)]
	pub ip: Option<String>,

	/// Serve via port. Default: 8080
	#[arg(short, long, display_order = 0)]
	pub port: Option<u16>,

	/// Folder with the web frontend (index.html, scripts, styles). Default: current directory
	#[arg(short = 's', long = "static", value_name = "FOLDER", display_order = 1)]
	pub static_folder: Option<PathBuf>,

	/// Overpass API endpoint. Default: https://overpass-api.de/api/interpreter
	#[arg(long, value_name = "URL", display_order = 2)]
	pub overpass_url: Option<String>,

	/// Shutdown server automatically after x milliseconds.
	#[arg(long, display_order = 4)]
	pub auto_shutdown: Option<u64>,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let config = load_config(arguments)?;
	let exporter = Exporter::from_config(&config)?;
	eprintln!("   overpass:  {}", config.overpass.url);
	eprintln!("   static:    {:?}", config.static_folder());

	let mut server = MapServer::new(config, exporter);
	server.start().await?;
	eprintln!("   listening: http://{}/", server.local_addr()?);

	if let Some(milliseconds) = arguments.auto_shutdown {
		sleep(Duration::from_millis(milliseconds)).await;
		server.stop().await;
	} else {
		loop {
			sleep(Duration::from_secs(60)).await
		}
	}

	Ok(())
}

/// Config file (or defaults) with the command line arguments applied on top.
fn load_config(arguments: &Subcommand) -> Result<Config> {
	let mut config = match &arguments.config {
		Some(path) => Config::from_path(path)?,
		None => Config::default(),
	};
	config.server.override_optional_ip(&arguments.ip);
	config.server.override_optional_port(&arguments.port);
	config.override_optional_static_folder(&arguments.static_folder);
	config.overpass.override_optional_url(&arguments.overpass_url);
	Ok(config)
}

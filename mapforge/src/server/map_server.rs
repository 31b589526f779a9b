use super::{
	handlers::AppState,
	routes::{add_cors, add_extra_headers, add_routes},
	static_folder::StaticFolder,
};
use crate::{config::Config, export::Exporter};
use anyhow::{Result, anyhow};
use axum::Router;
use mapforge_derive::context;
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::oneshot::Sender;

pub struct MapServer {
	config: Config,
	exporter: Arc<Exporter>,
	exit_signal: Option<Sender<()>>,
	local_addr: Option<SocketAddr>,
}

impl MapServer {
	pub fn new(config: Config, exporter: Exporter) -> MapServer {
		MapServer {
			config,
			exporter: Arc::new(exporter),
			exit_signal: None,
			local_addr: None,
		}
	}

	/// The complete app with CORS and extra headers.
	#[context("building router")]
	pub fn router(&self) -> Result<Router> {
		let state = AppState {
			exporter: Arc::clone(&self.exporter),
			static_folder: Arc::new(StaticFolder::new(&self.config.static_folder())?),
		};
		let mut app = add_routes(state);
		app = add_cors(app, &self.config.cors)?;
		app = add_extra_headers(app, &self.config.extra_response_headers)?;
		Ok(app)
	}

	#[context("starting server")]
	pub async fn start(&mut self) -> Result<()> {
		if self.exit_signal.is_some() {
			self.stop().await;
		}

		let router = self.router()?;
		let addr = format!("{}:{}", self.config.server.ip(), self.config.server.port());
		let listener = tokio::net::TcpListener::bind(&addr).await?;
		let local_addr = listener.local_addr()?;
		log::info!("server starts listening on {local_addr}");

		let (tx, rx) = tokio::sync::oneshot::channel::<()>();
		tokio::spawn(async move {
			let result = axum::serve(listener, router.into_make_service())
				.with_graceful_shutdown(async {
					rx.await.ok();
				})
				.await;
			if let Err(err) = result {
				log::error!("server stopped with error: {err}");
			}
		});

		self.exit_signal = Some(tx);
		self.local_addr = Some(local_addr);
		Ok(())
	}

	pub async fn stop(&mut self) {
		let Some(exit_signal) = self.exit_signal.take() else {
			return;
		};
		log::info!("stopping server");
		if exit_signal.send(()).is_err() {
			log::warn!("server was already stopped");
		}
		self.local_addr = None;
	}

	/// Address the running server is bound to.
	pub fn local_addr(&self) -> Result<SocketAddr> {
		self.local_addr.ok_or_else(|| anyhow!("server is not running"))
	}
}

mod auth;
mod generation;
mod recent;

use excelvision_core::gateway::ReqwestGateway;
use excelvision_core::ClientConfig;
use std::path::Path;
use url::Url;

fn backend_url(server: &mockito::ServerGuard) -> Url {
    Url::parse(&server.url()).expect("mock server url")
}

fn gateway_for(server: &mockito::ServerGuard) -> ReqwestGateway {
    ReqwestGateway::new(&backend_url(server), None).expect("gateway")
}

/// Config pointing at `server`, with all local state under `root`.
fn config_for(server: &mockito::ServerGuard, root: &Path) -> ClientConfig {
    ClientConfig {
        backend_url: backend_url(server),
        download_dir: root.join("downloads"),
        state_dir: root.join("state"),
        ..ClientConfig::default()
    }
}

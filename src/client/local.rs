//! In-process transport.

use super::HttpTransport;
use crate::error::ScimResult;
use crate::server::{ScimRequest, ScimResponse, ScimServer};

use std::future::Future;
use std::sync::Arc;

/// Delivers requests straight to a [`ScimServer`] in the same process.
#[derive(Clone)]
pub struct LocalTransport {
    server: Arc<ScimServer>,
}

impl LocalTransport {
    pub fn new(server: Arc<ScimServer>) -> Self {
        Self { server }
    }

    pub fn server(&self) -> &Arc<ScimServer> {
        &self.server
    }
}

impl HttpTransport for LocalTransport {
    fn send(&self, request: ScimRequest) -> impl Future<Output = ScimResult<ScimResponse>> + Send {
        let server = Arc::clone(&self.server);
        async move { Ok(server.handle(request).await) }
    }
}

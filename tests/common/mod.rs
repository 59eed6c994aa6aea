use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use logbench::api::grpc::log_store_server::{LogStore, LogStoreServer};
use logbench::api::grpc::{
    AppendRequest, AppendResponse, DeleteRequest, DeleteResponse, GetRequest, GetResponse,
    SearchRequest, SearchResponse,
};
use tokio::net::TcpListener;
use tonic::transport::server::TcpIncoming;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

/// Per-kind counters shared between a mock server and the test asserting on
/// what it received.
#[derive(Default)]
pub struct OpCounts {
    pub get: AtomicU64,
    pub search: AtomicU64,
    pub append: AtomicU64,
    pub delete: AtomicU64,
}

impl OpCounts {
    pub fn total(&self) -> u64 {
        self.get.load(Ordering::SeqCst)
            + self.search.load(Ordering::SeqCst)
            + self.append.load(Ordering::SeqCst)
            + self.delete.load(Ordering::SeqCst)
    }
}

/// Stateless in-process stand-in for the log store: optional fixed delay per
/// call, optional unconditional failure, counts every received call.
#[derive(Default)]
pub struct MockStore {
    pub delay: Option<Duration>,
    pub fail: bool,
    pub counts: Arc<OpCounts>,
}

impl MockStore {
    async fn observe(&self, counter: &AtomicU64) -> Result<(), Status> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(Status::internal("mock configured to fail"));
        }
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tonic::async_trait]
impl LogStore for MockStore {
    async fn get(&self, _req: Request<GetRequest>) -> Result<Response<GetResponse>, Status> {
        self.observe(&self.counts.get).await?;
        Ok(Response::new(GetResponse {
            value: b"value".to_vec(),
        }))
    }

    async fn search(
        &self,
        _req: Request<SearchRequest>,
    ) -> Result<Response<SearchResponse>, Status> {
        self.observe(&self.counts.search).await?;
        Ok(Response::new(SearchResponse { keys: vec![1, 2, 3] }))
    }

    async fn append(
        &self,
        _req: Request<AppendRequest>,
    ) -> Result<Response<AppendResponse>, Status> {
        self.observe(&self.counts.append).await?;
        Ok(Response::new(AppendResponse {
            key: self.counts.append.load(Ordering::SeqCst) as i64,
        }))
    }

    async fn delete(
        &self,
        _req: Request<DeleteRequest>,
    ) -> Result<Response<DeleteResponse>, Status> {
        self.observe(&self.counts.delete).await?;
        Ok(Response::new(DeleteResponse { success: true }))
    }
}

/// Binds the mock on an ephemeral port and serves it for the rest of the
/// test. Returns the bound address and the shared counters.
pub async fn spawn_mock(mock: MockStore) -> (SocketAddr, Arc<OpCounts>) {
    let counts = Arc::clone(&mock.counts);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let incoming = TcpIncoming::from_listener(listener, true, None).unwrap();
    tokio::spawn(
        Server::builder()
            .add_service(LogStoreServer::new(mock))
            .serve_with_incoming(incoming),
    );
    (addr, counts)
}

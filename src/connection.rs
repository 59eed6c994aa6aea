use tonic::transport::Channel;
use tonic::Status;

use crate::api::{grpc, LogStoreClient};
use crate::error::{BenchError, Result};
use crate::workload::Operation;

/// One RPC session, exclusively owned by the benchmark worker that opened
/// it. Dropping the connection releases the transport.
#[derive(Debug)]
pub struct Connection {
    client: LogStoreClient<Channel>,
}

impl Connection {
    /// Establish a session with the log store. No retry: an unreachable
    /// endpoint surfaces immediately as a `Connection` error.
    pub async fn open(host: &str, port: u16) -> Result<Self> {
        let addr = format!("http://{host}:{port}");
        let endpoint = Channel::from_shared(addr.clone())
            .map_err(|e| BenchError::Config(format!("invalid endpoint {addr}: {e}")))?;
        let channel = endpoint
            .connect()
            .await
            .map_err(|source| BenchError::Connection { addr, source })?;
        Ok(Self {
            client: LogStoreClient::new(channel),
        })
    }

    pub async fn get(&mut self, key: i64) -> std::result::Result<Vec<u8>, Status> {
        let resp = self.client.get(grpc::GetRequest { key }).await?;
        Ok(resp.into_inner().value)
    }

    pub async fn search(&mut self, query: String) -> std::result::Result<Vec<i64>, Status> {
        let resp = self.client.search(grpc::SearchRequest { query }).await?;
        Ok(resp.into_inner().keys)
    }

    pub async fn append(&mut self, value: Vec<u8>) -> std::result::Result<i64, Status> {
        let resp = self.client.append(grpc::AppendRequest { value }).await?;
        Ok(resp.into_inner().key)
    }

    pub async fn delete(&mut self, key: i64) -> std::result::Result<bool, Status> {
        let resp = self.client.delete(grpc::DeleteRequest { key }).await?;
        Ok(resp.into_inner().success)
    }

    /// Issue one synthesized call, discarding the response body. The
    /// benchmarks only time completion, they never inspect results.
    pub async fn issue(&mut self, op: Operation) -> std::result::Result<(), Status> {
        match op {
            Operation::Get { key } => self.get(key).await.map(drop),
            Operation::Search { query } => self.search(query).await.map(drop),
            Operation::Append { value } => self.append(value).await.map(drop),
            Operation::Delete { key } => self.delete(key).await.map(drop),
        }
    }
}

pub mod grpc {
    tonic::include_proto!("logstore");
}

pub use grpc::log_store_client::LogStoreClient;

//! Job control service, package `pps.v1`.

/// Reference to a job.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Job {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
}

/// Named repository of versioned data.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Repo {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
}

/// Immutable data version within a repository.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Commit {
    #[prost(message, optional, tag = "1")]
    pub repo: ::core::option::Option<Repo>,
    #[prost(string, tag = "2")]
    pub id: ::prost::alloc::string::String,
}

/// User command and its standard input.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Transform {
    #[prost(string, repeated, tag = "1")]
    pub cmd: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(string, tag = "2")]
    pub stdin: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StartJobRequest {
    #[prost(message, optional, tag = "1")]
    pub job: ::core::option::Option<Job>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StartJobResponse {
    #[prost(message, repeated, tag = "1")]
    pub input_commits: ::prost::alloc::vec::Vec<Commit>,
    #[prost(message, optional, tag = "2")]
    pub output_commit: ::core::option::Option<Commit>,
    #[prost(uint64, tag = "3")]
    pub shard: u64,
    #[prost(message, optional, tag = "4")]
    pub transform: ::core::option::Option<Transform>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FinishJobRequest {
    #[prost(message, optional, tag = "1")]
    pub job: ::core::option::Option<Job>,
    #[prost(uint64, tag = "2")]
    pub shard: u64,
    #[prost(bool, tag = "3")]
    pub success: bool,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct FinishJobResponse {}

/// Client for `pps.v1.JobAPI`.
pub mod job_api_client {
    use tonic::codegen::http::uri::PathAndQuery;
    use tonic::transport::Channel;
    use tonic::{IntoRequest, Response, Status};

    use super::{FinishJobRequest, FinishJobResponse, StartJobRequest, StartJobResponse};

    #[derive(Debug, Clone)]
    pub struct JobApiClient {
        inner: tonic::client::Grpc<Channel>,
    }

    impl JobApiClient {
        pub fn new(channel: Channel) -> Self {
            Self {
                inner: tonic::client::Grpc::new(channel),
            }
        }

        /// Claim the work allocated to a job.
        pub async fn start_job(
            &mut self,
            request: impl IntoRequest<StartJobRequest>,
        ) -> Result<Response<StartJobResponse>, Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| Status::unavailable(format!("service was not ready: {}", e)))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = PathAndQuery::from_static("/pps.v1.JobAPI/StartJob");
            self.inner.unary(request.into_request(), path, codec).await
        }

        /// Record the outcome of a job shard.
        pub async fn finish_job(
            &mut self,
            request: impl IntoRequest<FinishJobRequest>,
        ) -> Result<Response<FinishJobResponse>, Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| Status::unavailable(format!("service was not ready: {}", e)))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = PathAndQuery::from_static("/pps.v1.JobAPI/FinishJob");
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
}

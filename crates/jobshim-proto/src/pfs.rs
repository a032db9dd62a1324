//! Versioned filesystem mount service, package `pfs.v1`.

use crate::pps::Commit;

/// A commit to expose below the mount root.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CommitMount {
    #[prost(message, optional, tag = "1")]
    pub commit: ::core::option::Option<Commit>,
    /// Empty means the repository name is used.
    #[prost(string, tag = "2")]
    pub alias: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MountRequest {
    #[prost(string, tag = "1")]
    pub root: ::prost::alloc::string::String,
    #[prost(uint64, tag = "2")]
    pub shard: u64,
    #[prost(message, repeated, tag = "3")]
    pub mounts: ::prost::alloc::vec::Vec<CommitMount>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum MountState {
    Unspecified = 0,
    /// The view is usable.
    Ready = 1,
}

/// Progress of a mount, streamed for as long as the view is served.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct MountEvent {
    #[prost(enumeration = "MountState", tag = "1")]
    pub state: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UnmountRequest {
    #[prost(string, tag = "1")]
    pub root: ::prost::alloc::string::String,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct UnmountResponse {}

/// Client for `pfs.v1.MountAPI`.
pub mod mount_api_client {
    use tonic::codegen::http::uri::PathAndQuery;
    use tonic::transport::Channel;
    use tonic::{IntoRequest, Response, Status, Streaming};

    use super::{MountEvent, MountRequest, UnmountRequest, UnmountResponse};

    #[derive(Debug, Clone)]
    pub struct MountApiClient {
        inner: tonic::client::Grpc<Channel>,
    }

    impl MountApiClient {
        pub fn new(channel: Channel) -> Self {
            Self {
                inner: tonic::client::Grpc::new(channel),
            }
        }

        /// Mount commits below a root. The response stream stays open while
        /// the view is being served.
        pub async fn mount(
            &mut self,
            request: impl IntoRequest<MountRequest>,
        ) -> Result<Response<Streaming<MountEvent>>, Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| Status::unavailable(format!("service was not ready: {}", e)))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = PathAndQuery::from_static("/pfs.v1.MountAPI/Mount");
            self.inner
                .server_streaming(request.into_request(), path, codec)
                .await
        }

        pub async fn unmount(
            &mut self,
            request: impl IntoRequest<UnmountRequest>,
        ) -> Result<Response<UnmountResponse>, Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| Status::unavailable(format!("service was not ready: {}", e)))?;
            let codec = tonic::codec::ProstCodec::default();
            let path = PathAndQuery::from_static("/pfs.v1.MountAPI/Unmount");
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
}

//! Thin `reqwest` client over the Channel Service HTTP surface.

use crate::config::ControllerConfig;
use channel_service::types::{
    ComputeSinrRequest, ComputeSinrResponse, ComputeSingleRequest, ComputeSingleResponse,
    HealthResponse, LoadSceneRequest, SetTransmissionStateRequest, TransmissionStateResponse,
};
use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("channel service returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

pub struct ChannelServiceClient {
    http: reqwest::Client,
    base_url: String,
}

impl ChannelServiceClient {
    pub fn new(config: &ControllerConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.compute_timeout)
            .build()
            .expect("reqwest client builder should not fail with static config");
        Self {
            http,
            base_url: config.service_base_url.clone(),
        }
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            Err(ClientError::Status { status, body })
        }
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let resp = self.http.get(format!("{}/health", self.base_url)).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn load_scene(&self, req: &LoadSceneRequest) -> Result<(), ClientError> {
        let resp = self
            .http
            .post(format!("{}/scene/load", self.base_url))
            .json(req)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    pub async fn compute_single(&self, req: &ComputeSingleRequest) -> Result<ComputeSingleResponse, ClientError> {
        let resp = self
            .http
            .post(format!("{}/compute/single", self.base_url))
            .json(req)
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn compute_sinr(&self, req: &ComputeSinrRequest) -> Result<ComputeSinrResponse, ClientError> {
        let resp = self
            .http
            .post(format!("{}/compute/sinr", self.base_url))
            .json(req)
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn set_transmission_state(
        &self,
        req: &SetTransmissionStateRequest,
    ) -> Result<TransmissionStateResponse, ClientError> {
        let resp = self
            .http
            .post(format!("{}/api/transmission/state", self.base_url))
            .json(req)
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }
}

//! Handle on a remote DIAL device.
//!
//! A [`DialDevice`] is resolved from a device description URL, usually one
//! reported by discovery. From then on every operation is plain HTTP against the
//! device's application URL.

use dial_xml::{parse_app_info, parse_device_descriptor, AppInfo, Icon, XmlValue};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

use crate::error::{ClientError, Result};

const APPLICATION_URL: &str = "application-url";
const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=\"utf-8\"";

/// A DIAL device whose description has been fetched.
#[derive(Debug, Clone)]
pub struct DialDevice {
    http: reqwest::Client,
    description_url: String,
    application_url: String,
    info: XmlValue,
}

impl DialDevice {
    /// Fetch and parse the device description at `description_url`.
    ///
    /// # Errors
    ///
    /// - `DescriptorUnavailable` unless the device answers 200 with an
    ///   `Application-URL` header
    /// - `Parse` if the description is malformed or has no `root.device` element
    pub async fn resolve(http: &reqwest::Client, description_url: &str) -> Result<Self> {
        if description_url.is_empty() {
            return Err(ClientError::InvalidArgument("description URL is empty".to_string()));
        }
        let url = Url::parse(description_url).map_err(|e| {
            ClientError::InvalidArgument(format!("invalid description URL {}: {}", description_url, e))
        })?;

        let response = http.get(url).send().await?;
        let status = response.status();
        let application_url = response
            .headers()
            .get(APPLICATION_URL)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let application_url = match application_url {
            Some(url) if status == StatusCode::OK => url,
            _ => {
                return Err(ClientError::DescriptorUnavailable {
                    url: description_url.to_string(),
                    status_code: status.as_u16(),
                })
            }
        };
        let application_url = application_url
            .strip_suffix('/')
            .unwrap_or(&application_url)
            .to_string();

        let xml = response.text().await?;
        let info = parse_device_descriptor(&xml)?
            .path(&["root", "device"])
            .cloned()
            .ok_or_else(|| ClientError::Parse("device description has no root.device element".to_string()))?;

        debug!("Resolved DIAL device {} (apps at {})", description_url, application_url);
        Ok(Self {
            http: http.clone(),
            description_url: description_url.to_string(),
            application_url,
            info,
        })
    }

    pub fn description_url(&self) -> &str {
        &self.description_url
    }

    /// Value of the `Application-URL` header, without a trailing slash.
    pub fn application_url(&self) -> &str {
        &self.application_url
    }

    /// The parsed `root.device` element.
    pub fn info(&self) -> &XmlValue {
        &self.info
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.info.text_at(&["friendlyName"])
    }

    pub fn manufacturer(&self) -> Option<&str> {
        self.info.text_at(&["manufacturer"])
    }

    pub fn model_name(&self) -> Option<&str> {
        self.info.text_at(&["modelName"])
    }

    pub fn udn(&self) -> Option<&str> {
        self.info.text_at(&["UDN"])
    }

    pub fn device_type(&self) -> Option<&str> {
        self.info.text_at(&["deviceType"])
    }

    /// Icons of every `iconList`, one or many.
    pub fn icons(&self) -> Vec<Icon> {
        Icon::list_from_device(&self.info)
    }

    /// Raw application description XML.
    pub async fn get_app_info_xml(&self, name: &str) -> Result<String> {
        let url = self.app_url(name)?;
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(ClientError::AppInfoUnavailable {
                status_code: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }

    /// Application description as a generic tree with namespace prefixes stripped.
    pub async fn get_app_info(&self, name: &str) -> Result<XmlValue> {
        let xml = self.get_app_info_xml(name).await?;
        Ok(parse_app_info(&xml)?)
    }

    /// Typed application description.
    pub async fn get_app(&self, name: &str) -> Result<AppInfo> {
        let tree = self.get_app_info(name).await?;
        Ok(AppInfo::from_tree(&tree)?)
    }

    /// Launch `name`, returning the response body.
    ///
    /// `content_type` defaults to `text/plain; charset="utf-8"`.
    pub async fn launch_app(
        &self,
        name: &str,
        payload: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<String> {
        let url = self.app_url(name)?;
        let body = payload.unwrap_or_default().to_string();

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, content_type.unwrap_or(DEFAULT_CONTENT_TYPE))
            .header(CONTENT_LENGTH, body.len())
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(ClientError::LaunchFailed {
                status_code: status.as_u16(),
            });
        }
        debug!("Launched {} on {} (HTTP {})", name, self.application_url, status);
        Ok(response.text().await?)
    }

    /// Stop instance `pid` of `name`, returning the status code the device answered with.
    pub async fn stop_app(&self, name: &str, pid: &str) -> Result<u16> {
        if pid.is_empty() {
            return Err(ClientError::InvalidArgument("pid is empty".to_string()));
        }
        let url = format!("{}/{}", self.app_url(name)?, pid);
        let response = self.http.delete(&url).send().await?;
        debug!("Stop {} returned HTTP {}", url, response.status());
        Ok(response.status().as_u16())
    }

    fn app_url(&self, name: &str) -> Result<String> {
        if self.application_url.is_empty() {
            return Err(ClientError::InvalidArgument("application URL is empty".to_string()));
        }
        if name.is_empty() {
            return Err(ClientError::InvalidArgument("application name is empty".to_string()));
        }
        Ok(format!("{}/{}", self.application_url, name))
    }
}

use crate::lib::config::PurchasePolicy;
use crate::lib::error::{AwsError, ConfigError, RecommenderError, Result};
use crate::lib::fetcher::RecommendationSource;
use crate::lib::service::Service;
use aws_credential_types::Credentials;
use aws_credential_types::provider::ProvideCredentials;
use aws_sigv4::http_request::{SignableBody, SignableRequest, SigningSettings};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use log::debug;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Client, Method, Request};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::{Duration, SystemTime};
use url::Url;

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const TARGET_PREFIX: &str = "AWSInsightsIndexService";
const SIGNING_NAME: &str = "ce";
const SAVINGS_PLANS_TYPE: &str = "COMPUTE_SP";

/// Cost Explorer client with AWS SigV4 authentication
pub struct CostExplorerClient {
    client: Client,
    endpoint: Url,
    region: String,
    credentials: Credentials,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ReservationPurchaseRecommendationRequest<'a> {
    service: &'a str,
    lookback_period_in_days: &'a str,
    term_in_years: &'a str,
    payment_option: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SavingsPlansPurchaseRecommendationRequest<'a> {
    savings_plans_type: &'a str,
    lookback_period_in_days: &'a str,
    term_in_years: &'a str,
    payment_option: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReservationPurchaseRecommendationResponse {
    #[serde(default)]
    pub recommendations: Vec<ReservationRecommendationGroup>,
}

/// One recommendation group, holding the per-instance-type details
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReservationRecommendationGroup {
    #[serde(default)]
    pub recommendation_details: Vec<RawReservationDetail>,
}

/// One reservation purchase recommendation
///
/// Amounts the report cannot do without stay `None` when Cost Explorer omits
/// them, so the normalizer can reject the detail instead of reporting zero.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawReservationDetail {
    #[serde(default)]
    pub instance_details: RawInstanceDetails,
    #[serde(default, deserialize_with = "de_required_amount")]
    pub recommended_number_of_instances_to_purchase: Option<f64>,
    #[serde(default, deserialize_with = "de_required_amount")]
    pub estimated_monthly_savings_amount: Option<f64>,
    #[serde(default, deserialize_with = "de_required_amount")]
    pub estimated_monthly_savings_percentage: Option<f64>,
    #[serde(default, deserialize_with = "de_required_amount")]
    pub upfront_cost: Option<f64>,
    #[serde(default, deserialize_with = "de_amount")]
    pub estimated_monthly_on_demand_cost: f64,
    #[serde(default, deserialize_with = "de_amount")]
    pub recurring_standard_monthly_cost: f64,
}

/// Service-specific containers; Cost Explorer populates exactly one
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawInstanceDetails {
    #[serde(rename = "EC2InstanceDetails", default)]
    pub ec2: Option<RawInstanceTypeDetails>,
    #[serde(rename = "RDSInstanceDetails", default)]
    pub rds: Option<RawInstanceTypeDetails>,
    #[serde(rename = "ElastiCacheInstanceDetails", default)]
    pub elasticache: Option<RawNodeTypeDetails>,
    #[serde(rename = "ESInstanceDetails", default)]
    pub opensearch: Option<RawSearchDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawInstanceTypeDetails {
    #[serde(default)]
    pub instance_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawNodeTypeDetails {
    #[serde(default)]
    pub node_type: String,
}

/// OpenSearch reports the instance class and size separately
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawSearchDetails {
    #[serde(default)]
    pub instance_class: String,
    #[serde(default)]
    pub instance_size: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SavingsPlansPurchaseRecommendationResponse {
    #[serde(default)]
    pub savings_plans_purchase_recommendation: Option<SavingsPlansPurchaseRecommendation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SavingsPlansPurchaseRecommendation {
    #[serde(default)]
    pub savings_plans_purchase_recommendation_details: Vec<RawSavingsPlanDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawSavingsPlanDetail {
    #[serde(default, deserialize_with = "de_required_amount")]
    pub hourly_commitment_to_purchase: Option<f64>,
    #[serde(default, deserialize_with = "de_required_amount")]
    pub estimated_monthly_savings_amount: Option<f64>,
    #[serde(default, deserialize_with = "de_required_amount")]
    pub estimated_savings_percentage: Option<f64>,
    #[serde(default, deserialize_with = "de_required_amount")]
    pub upfront_cost: Option<f64>,
    #[serde(default, deserialize_with = "de_amount")]
    pub current_average_hourly_on_demand_spend: f64,
}

/// Error body returned by JSON-1.1 AWS services
#[derive(Debug, Default, Deserialize)]
struct AwsErrorBody {
    #[serde(rename = "__type", default)]
    error_type: Option<String>,
    #[serde(default, alias = "Message")]
    message: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Amount {
    Number(f64),
    Text(String),
}

/// Cost Explorer sends amounts as decimal strings
///
/// Absent, `null` and blank amounts decode to `None`.
fn de_required_amount<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Amount>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Amount::Number(value)) => Ok(Some(value)),
        Some(Amount::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Amount::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid amount '{}': {}", text, e))),
    }
}

/// Informational amounts that default to zero when absent
fn de_amount<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(de_required_amount(deserializer)?.unwrap_or(0.0))
}

/// Map an unsuccessful Cost Explorer response to an [`AwsError`]
pub fn classify_error(status: u16, body: &str) -> AwsError {
    let parsed: AwsErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed
        .error_type
        .as_deref()
        .and_then(|t| t.rsplit('#').next())
        .unwrap_or_default();
    let message = parsed
        .message
        .unwrap_or_else(|| body.trim().to_string());
    let detail = if code.is_empty() {
        format!("HTTP {}: {}", status, message)
    } else {
        format!("{}: {}", code, message)
    };

    match code {
        "ThrottlingException" | "LimitExceededException" | "RequestLimitExceeded" => {
            AwsError::RateLimited(detail)
        }
        "AccessDeniedException" => AwsError::PermissionDenied(detail),
        "UnrecognizedClientException"
        | "InvalidSignatureException"
        | "IncompleteSignature"
        | "ExpiredTokenException"
        | "InvalidClientTokenId"
        | "MissingAuthenticationToken" => AwsError::AuthenticationFailed(detail),
        _ if status == 429 => AwsError::RateLimited(detail),
        _ if status == 403 => AwsError::PermissionDenied(detail),
        _ => AwsError::ServiceError(format!("HTTP {}: {}", status, detail)),
    }
}

impl CostExplorerClient {
    /// Create a new Cost Explorer client with AWS credentials
    pub async fn new(endpoint: Url, region: String) -> Result<Self> {
        // Load AWS credentials from environment
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let credentials = config
            .credentials_provider()
            .ok_or_else(|| {
                AwsError::AuthenticationFailed("no credentials provider configured".to_string())
            })?
            .provide_credentials()
            .await
            .map_err(|e| AwsError::AuthenticationFailed(e.to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RecommenderError::Network(e.to_string()))?;

        debug!("Cost Explorer endpoint: {} (region {})", endpoint, region);

        Ok(Self {
            client,
            endpoint,
            region,
            credentials,
        })
    }

    /// Call `GetReservationPurchaseRecommendation` for one service
    pub async fn get_reservation_purchase_recommendation(
        &self,
        service_name: &str,
        policy: &PurchasePolicy,
    ) -> Result<ReservationPurchaseRecommendationResponse> {
        let request = ReservationPurchaseRecommendationRequest {
            service: service_name,
            lookback_period_in_days: policy.lookback.as_api_str(),
            term_in_years: policy.term.as_api_str(),
            payment_option: policy.payment_option.as_api_str(),
        };

        self.execute_request("GetReservationPurchaseRecommendation", &request)
            .await
    }

    /// Call `GetSavingsPlansPurchaseRecommendation` for Compute Savings Plans
    pub async fn get_savings_plans_purchase_recommendation(
        &self,
        policy: &PurchasePolicy,
    ) -> Result<SavingsPlansPurchaseRecommendationResponse> {
        let request = SavingsPlansPurchaseRecommendationRequest {
            savings_plans_type: SAVINGS_PLANS_TYPE,
            lookback_period_in_days: policy.lookback.as_api_str(),
            term_in_years: policy.term.as_api_str(),
            payment_option: policy.payment_option.as_api_str(),
        };

        self.execute_request("GetSavingsPlansPurchaseRecommendation", &request)
            .await
    }

    /// Execute a signed JSON-1.1 request
    async fn execute_request<B, T>(&self, operation: &str, body: &B) -> Result<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body).map_err(|e| {
            RecommenderError::Parse(format!("Failed to encode {} request: {}", operation, e))
        })?;
        let target = format!("{}.{}", TARGET_PREFIX, operation);
        let headers = [("content-type", CONTENT_TYPE), ("x-amz-target", target.as_str())];

        // Sign the request with AWS SigV4
        let signable_request = SignableRequest::new(
            Method::POST.as_str(),
            self.endpoint.as_str(),
            headers.iter().copied(),
            SignableBody::Bytes(&payload),
        )
        .map_err(|e| AwsError::SigningFailed(e.to_string()))?;

        let identity: Identity = self.credentials.clone().into();
        let signing_params = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name(SIGNING_NAME)
            .time(SystemTime::now())
            .settings(SigningSettings::default())
            .build()
            .map_err(|e| AwsError::SigningFailed(e.to_string()))?
            .into();

        let (signing_instructions, _) =
            aws_sigv4::http_request::sign(signable_request, &signing_params)
                .map_err(|e| AwsError::SigningFailed(e.to_string()))?
                .into_parts();

        let mut request = Request::new(Method::POST, self.endpoint.clone());
        for (name, value) in headers.iter().copied().chain(signing_instructions.headers()) {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| AwsError::SigningFailed(e.to_string()))?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| AwsError::SigningFailed(e.to_string()))?;
            request.headers_mut().insert(header_name, header_value);
        }
        *request.body_mut() = Some(payload.into());

        debug!("POST {} ({})", self.endpoint, target);

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| RecommenderError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RecommenderError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &text).into());
        }

        serde_json::from_str(&text).map_err(|e| {
            AwsError::InvalidResponse(format!("{} response: {}", operation, e)).into()
        })
    }
}

impl RecommendationSource for CostExplorerClient {
    async fn reservation_recommendations(
        &self,
        service: Service,
        policy: &PurchasePolicy,
    ) -> Result<Vec<ReservationRecommendationGroup>> {
        let service_name = service.cost_explorer_name().ok_or_else(|| {
            ConfigError::InvalidValue(format!("{} has no reservation recommendations", service))
        })?;

        let response = self
            .get_reservation_purchase_recommendation(service_name, policy)
            .await?;
        Ok(response.recommendations)
    }

    async fn savings_plans_recommendations(
        &self,
        policy: &PurchasePolicy,
    ) -> Result<Vec<RawSavingsPlanDetail>> {
        let response = self.get_savings_plans_purchase_recommendation(policy).await?;
        Ok(response
            .savings_plans_purchase_recommendation
            .map(|r| r.savings_plans_purchase_recommendation_details)
            .unwrap_or_default())
    }
}

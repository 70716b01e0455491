use crate::infrastructure::error::InfraError;
use crate::infrastructure::event_mapper::GoogleCalendarEvent;
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3/";
const CALENDAR_LIST_PAGE_SIZE: &str = "250";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleCalendarSummary {
    pub id: String,
    pub summary: String,
}

#[async_trait]
pub trait GoogleCalendarClient: Send + Sync {
    /// Every calendar visible to the credential, across all pages.
    async fn list_calendars(
        &self,
        access_token: &str,
    ) -> Result<Vec<GoogleCalendarSummary>, InfraError>;

    async fn create_calendar(
        &self,
        access_token: &str,
        summary: &str,
        time_zone: Option<&str>,
    ) -> Result<GoogleCalendarSummary, InfraError>;

    async fn delete_calendar(&self, access_token: &str, calendar_id: &str)
    -> Result<(), InfraError>;

    /// A single page of at most `max_results` events.
    async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        max_results: u32,
    ) -> Result<Vec<GoogleCalendarEvent>, InfraError>;

    async fn create_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event: &GoogleCalendarEvent,
    ) -> Result<String, InfraError>;

    async fn delete_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<(), InfraError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestGoogleCalendarClient {
    client: Client,
    api_base: String,
}

impl Default for ReqwestGoogleCalendarClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestGoogleCalendarClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            api_base: GOOGLE_CALENDAR_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(api_base: &str) -> Result<Self, InfraError> {
        let api_base = api_base.trim();
        let api_base = if api_base.ends_with('/') {
            api_base.to_string()
        } else {
            format!("{api_base}/")
        };
        let parsed = Url::parse(&api_base)
            .map_err(|error| InfraError::InvalidConfig(format!("invalid calendar api base url: {error}")))?;
        if parsed.cannot_be_a_base() {
            return Err(InfraError::InvalidConfig(
                "calendar api base URL cannot be a base".to_string(),
            ));
        }
        Ok(Self {
            client: Client::new(),
            api_base,
        })
    }

    fn ensure_non_empty(value: &str, field: &str) -> Result<(), InfraError> {
        if value.trim().is_empty() {
            return Err(InfraError::Api(format!("{field} must not be empty")));
        }
        Ok(())
    }

    fn api_http_error(status: reqwest::StatusCode, body: &str) -> InfraError {
        let message = if body.trim().is_empty() {
            format!("google calendar api error: http {}", status.as_u16())
        } else {
            format!("google calendar api error: http {}; body={body}", status.as_u16())
        };
        InfraError::Api(message)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, InfraError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|error| InfraError::Api(format!("invalid calendar api base url: {error}")))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| InfraError::Api("calendar api base URL cannot be a base".to_string()))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    async fn read_body(
        response: reqwest::Response,
        action: &str,
    ) -> Result<(reqwest::StatusCode, String), InfraError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| InfraError::Api(format!("failed reading {action} response: {error}")))?;
        Ok((status, body))
    }

    async fn send_expecting_success(
        request: reqwest::RequestBuilder,
        action: &str,
    ) -> Result<String, InfraError> {
        let response = request
            .send()
            .await
            .map_err(|error| InfraError::Api(format!("network error while {action}: {error}")))?;
        let (status, body) = Self::read_body(response, action).await?;
        if !status.is_success() {
            return Err(Self::api_http_error(status, &body));
        }
        Ok(body)
    }
}

#[derive(Debug, serde::Deserialize)]
struct CalendarListResponse {
    items: Option<Vec<CalendarListItem>>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct CalendarListItem {
    id: String,
    summary: Option<String>,
}

#[derive(Debug, serde::Serialize)]
struct CreateCalendarRequest<'a> {
    summary: &'a str,
    #[serde(rename = "timeZone", skip_serializing_if = "Option::is_none")]
    time_zone: Option<&'a str>,
}

#[derive(Debug, serde::Deserialize)]
struct CalendarResourceResponse {
    id: Option<String>,
    summary: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct EventsPageResponse {
    items: Option<Vec<GoogleCalendarEvent>>,
}

#[derive(Debug, serde::Deserialize)]
struct CreatedEventResponse {
    id: Option<String>,
}

#[async_trait]
impl GoogleCalendarClient for ReqwestGoogleCalendarClient {
    async fn list_calendars(
        &self,
        access_token: &str,
    ) -> Result<Vec<GoogleCalendarSummary>, InfraError> {
        Self::ensure_non_empty(access_token, "access token")?;

        let endpoint = self.endpoint(&["users", "me", "calendarList"])?;
        let mut page_token: Option<String> = None;
        let mut calendars = Vec::new();

        loop {
            let mut request = self
                .client
                .get(endpoint.clone())
                .query(&[("maxResults", CALENDAR_LIST_PAGE_SIZE)])
                .bearer_auth(access_token);
            if let Some(page_token) = page_token.as_deref() {
                request = request.query(&[("pageToken", page_token)]);
            }

            let body = Self::send_expecting_success(request, "listing calendars").await?;
            let parsed: CalendarListResponse = serde_json::from_str(&body).map_err(|error| {
                InfraError::Api(format!("invalid calendar list payload: {error}; body={body}"))
            })?;

            calendars.extend(parsed.items.unwrap_or_default().into_iter().filter_map(|item| {
                let id = item.id.trim();
                if id.is_empty() {
                    return None;
                }
                let summary = item
                    .summary
                    .unwrap_or_else(|| id.to_string())
                    .trim()
                    .to_string();
                Some(GoogleCalendarSummary {
                    id: id.to_string(),
                    summary,
                })
            }));

            match parsed.next_page_token.filter(|token| !token.trim().is_empty()) {
                Some(next_page_token) => page_token = Some(next_page_token),
                None => break,
            }
        }

        Ok(calendars)
    }

    async fn create_calendar(
        &self,
        access_token: &str,
        summary: &str,
        time_zone: Option<&str>,
    ) -> Result<GoogleCalendarSummary, InfraError> {
        Self::ensure_non_empty(access_token, "access token")?;
        Self::ensure_non_empty(summary, "calendar summary")?;

        let summary = summary.trim();
        let request = CreateCalendarRequest {
            summary,
            time_zone: time_zone.map(str::trim).filter(|value| !value.is_empty()),
        };

        let endpoint = self.endpoint(&["calendars"])?;
        let body = Self::send_expecting_success(
            self.client.post(endpoint).bearer_auth(access_token).json(&request),
            "creating calendar",
        )
        .await?;

        let parsed: CalendarResourceResponse = serde_json::from_str(&body).map_err(|error| {
            InfraError::Api(format!("invalid calendar create payload: {error}; body={body}"))
        })?;

        let id = parsed
            .id
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| InfraError::Api("calendar create response did not include id".to_string()))?;
        let created_summary = parsed
            .summary
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| summary.to_string());

        Ok(GoogleCalendarSummary {
            id,
            summary: created_summary,
        })
    }

    async fn delete_calendar(
        &self,
        access_token: &str,
        calendar_id: &str,
    ) -> Result<(), InfraError> {
        Self::ensure_non_empty(access_token, "access token")?;
        Self::ensure_non_empty(calendar_id, "calendar id")?;

        let endpoint = self.endpoint(&["calendars", calendar_id])?;
        Self::send_expecting_success(
            self.client.delete(endpoint).bearer_auth(access_token),
            "deleting calendar",
        )
        .await?;
        Ok(())
    }

    async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        max_results: u32,
    ) -> Result<Vec<GoogleCalendarEvent>, InfraError> {
        Self::ensure_non_empty(access_token, "access token")?;
        Self::ensure_non_empty(calendar_id, "calendar id")?;

        let endpoint = self.endpoint(&["calendars", calendar_id, "events"])?;
        let request = self
            .client
            .get(endpoint)
            .bearer_auth(access_token)
            .query(&[("maxResults", max_results.to_string())]);
        let body = Self::send_expecting_success(request, "listing calendar events").await?;

        let parsed: EventsPageResponse = serde_json::from_str(&body).map_err(|error| {
            InfraError::Api(format!("invalid events list payload: {error}; body={body}"))
        })?;
        Ok(parsed.items.unwrap_or_default())
    }

    async fn create_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event: &GoogleCalendarEvent,
    ) -> Result<String, InfraError> {
        Self::ensure_non_empty(access_token, "access token")?;
        Self::ensure_non_empty(calendar_id, "calendar id")?;

        let endpoint = self.endpoint(&["calendars", calendar_id, "events"])?;
        let body = Self::send_expecting_success(
            self.client.post(endpoint).bearer_auth(access_token).json(event),
            "creating event",
        )
        .await?;

        let parsed: CreatedEventResponse = serde_json::from_str(&body).map_err(|error| {
            InfraError::Api(format!("invalid event create payload: {error}; body={body}"))
        })?;
        parsed
            .id
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| InfraError::Api("event create response did not include id".to_string()))
    }

    async fn delete_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<(), InfraError> {
        Self::ensure_non_empty(access_token, "access token")?;
        Self::ensure_non_empty(calendar_id, "calendar id")?;
        Self::ensure_non_empty(event_id, "event id")?;

        let endpoint = self.endpoint(&["calendars", calendar_id, "events", event_id])?;
        Self::send_expecting_success(
            self.client.delete(endpoint).bearer_auth(access_token),
            "deleting event",
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> ReqwestGoogleCalendarClient {
        ReqwestGoogleCalendarClient::with_api_base(&format!("{}/calendar/v3", server.uri()))
            .expect("valid mock base url")
    }

    #[tokio::test]
    async fn list_calendars_follows_every_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendar/v3/users/me/calendarList"))
            .and(query_param("pageToken", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{ "id": "cal-2", "summary": "HK1 2023-2024 - 20231" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/calendar/v3/users/me/calendarList"))
            .and(header("Authorization", "Bearer token-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{ "id": "cal-1", "summary": "Personal" }, { "id": " " }],
                "nextPageToken": "page-2"
            })))
            .mount(&server)
            .await;

        let calendars = client_for(&server)
            .await
            .list_calendars("token-1")
            .await
            .expect("list calendars");

        assert_eq!(
            calendars,
            vec![
                GoogleCalendarSummary {
                    id: "cal-1".to_string(),
                    summary: "Personal".to_string(),
                },
                GoogleCalendarSummary {
                    id: "cal-2".to_string(),
                    summary: "HK1 2023-2024 - 20231".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn create_calendar_sends_time_zone() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/calendar/v3/calendars"))
            .and(body_partial_json(serde_json::json!({
                "summary": "HK1 2023-2024 - 20231",
                "timeZone": "Asia/Ho_Chi_Minh"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "new-cal",
                "summary": "HK1 2023-2024 - 20231"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let created = client_for(&server)
            .await
            .create_calendar("token", "HK1 2023-2024 - 20231", Some("Asia/Ho_Chi_Minh"))
            .await
            .expect("create calendar");
        assert_eq!(created.id, "new-cal");
    }

    #[tokio::test]
    async fn http_failures_surface_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/calendar/v3/calendars/cal-1/events/evt-1"))
            .respond_with(ResponseTemplate::new(410).set_body_string("Resource has been deleted"))
            .mount(&server)
            .await;

        let error = client_for(&server)
            .await
            .delete_event("token", "cal-1", "evt-1")
            .await
            .expect_err("gone event");
        let message = error.to_string();
        assert!(message.contains("http 410"), "{message}");
        assert!(message.contains("Resource has been deleted"), "{message}");
    }

    #[tokio::test]
    async fn list_events_requests_bounded_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendar/v3/calendars/cal-1/events"))
            .and(query_param("maxResults", "2500"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{
                    "id": "evt-1",
                    "start": { "dateTime": "2023-11-14T13:00:00+07:00" },
                    "end": { "dateTime": "2023-11-14T16:30:00+07:00" }
                }],
                "nextPageToken": "ignored"
            })))
            .mount(&server)
            .await;

        let events = client_for(&server)
            .await
            .list_events("token", "cal-1", 2500)
            .await
            .expect("list events");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id.as_deref(), Some("evt-1"));
    }

    #[tokio::test]
    async fn create_event_requires_id_in_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/calendar/v3/calendars/cal-1/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let event: GoogleCalendarEvent = serde_json::from_value(serde_json::json!({
            "summary": "Vật lý - PHY101",
            "start": { "dateTime": "2023-11-14T07:00:00+07:00" },
            "end": { "dateTime": "2023-11-14T07:50:00+07:00" }
        }))
        .expect("event fixture");
        let result = client_for(&server)
            .await
            .create_event("token", "cal-1", &event)
            .await;
        assert!(matches!(result, Err(InfraError::Api(message)) if message.contains("did not include id")));
    }

    #[tokio::test]
    async fn empty_access_token_is_rejected_before_any_request() {
        let client = ReqwestGoogleCalendarClient::new();
        let result = client.list_calendars("  ").await;
        assert!(matches!(result, Err(InfraError::Api(_))));
    }
}

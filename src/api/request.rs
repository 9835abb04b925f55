//! API request helpers

use axum::body::Bytes;
use axum::extract::FromRequest;
use axum::extract::FromRequestParts;
use axum::extract::Json;
use axum::extract::Path;
use axum::extract::Request;
use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::PathRejection;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use url::Url;

use super::Error;

/// Longest accepted course code
const MAX_COURSE_CODE_LENGTH: usize = 32;

/// Trim a required text field
///
/// ```rust
/// assert_eq!(parse_required("title", " Lecture 1 ").unwrap(), "Lecture 1");
/// assert!(parse_required("title", "   ").is_err());
/// ```
pub fn parse_required(field: &str, value: &str) -> Result<String, Error> {
    let value = value.trim();

    if value.is_empty() {
        return Err(Error::bad_request(format!("Missing {field}")));
    }

    Ok(value.to_string())
}

/// Parse and normalize a course code
///
/// Whitespace is collapsed and letters are uppercased
///
/// ```rust
/// assert_eq!(parse_course_code(" math  1110 ").unwrap(), "MATH 1110");
/// ```
pub fn parse_course_code(code: &str) -> Result<String, Error> {
    let code = code
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase();

    if code.is_empty() {
        return Err(Error::bad_request("Missing course code"));
    }

    if code.chars().count() > MAX_COURSE_CODE_LENGTH {
        return Err(Error::bad_request(format!(
            "Course code can not be longer than {MAX_COURSE_CODE_LENGTH} characters"
        )));
    }

    if !code
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == ' ' || ch == '-')
    {
        return Err(Error::bad_request(
            "Course code can only contain letters, digits, spaces and dashes",
        ));
    }

    Ok(code)
}

/// Validate a price, prices are positive whole units
pub fn parse_price(price: i64) -> Result<i64, Error> {
    if price <= 0 {
        return Err(Error::bad_request("Price must be positive"));
    }

    Ok(price)
}

/// Parse and validate the URL of an asset
///
/// ```rust
/// let url = "https://www.example.com/note.pdf";
/// assert!(parse_url(url).is_ok())
/// ```
pub fn parse_url<I>(url: I) -> Result<Url, Error>
where
    I: AsRef<str>,
{
    let url = Url::parse(url.as_ref())
        .map_err(|err| Error::bad_request("Invalid URL").with_description(err))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(Error::bad_request("Invalid URL")
            .with_description(format!("Unsupported scheme: {scheme}"))),
    }
}

fn parse_json<J>(json: Result<Json<J>, JsonRejection>) -> Result<J, Error> {
    match json {
        Ok(Json(json)) => Ok(json),
        Err(err) => match err {
            JsonRejection::JsonDataError(err) => {
                let description = std::error::Error::source(&err)
                    .map_or_else(|| err.body_text(), ToString::to_string);

                Err(Error::bad_request("Data error").with_description(description))
            }
            JsonRejection::JsonSyntaxError(err) => {
                let description = std::error::Error::source(&err)
                    .map_or_else(|| err.body_text(), ToString::to_string);

                Err(Error::bad_request("JSON syntax error").with_description(description))
            }
            JsonRejection::MissingJsonContentType(_err) => Err(Error::bad_request(
                "Missing `application/json` content type",
            )),
            JsonRejection::BytesRejection(err) => {
                Err(Error::bad_request("Invalid characters in JSON").with_description(err))
            }
            err => Err(Error::bad_request("Unknown JSON error").with_description(err)),
        },
    }
}

/// Wrapper for the JSON extractor
pub struct Form<F>(pub F);

impl<S, F> FromRequest<S> for Form<F>
where
    S: Send + Sync,
    F: DeserializeOwned + Send,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        parse_json(Json::<F>::from_request(req, state).await).map(Form)
    }
}

/// JSON body that may be left out completely
///
/// An empty body gives `None`, anything else must be valid JSON
pub struct OptionalForm<F>(pub Option<F>);

impl<S, F> FromRequest<S> for OptionalForm<F>
where
    S: Send + Sync,
    F: DeserializeOwned + Send,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|err| Error::bad_request("Invalid body").with_description(err))?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalForm(None));
        }

        serde_json::from_slice(&body)
            .map(|form| OptionalForm(Some(form)))
            .map_err(|err| Error::bad_request("Data error").with_description(err))
    }
}

fn parse_path<P>(path: Result<Path<P>, PathRejection>) -> Result<P, Error> {
    match path {
        Ok(Path(path)) => Ok(path),
        Err(err) => match err {
            PathRejection::FailedToDeserializePathParams(err) => {
                Err(Error::bad_request("Invalid path parameter").with_description(err))
            }
            PathRejection::MissingPathParams(err) => {
                Err(Error::bad_request("Missing path parameter").with_description(err))
            }
            err => Err(Error::bad_request("Unknown path error").with_description(err)),
        },
    }
}

/// Wrapper for the path extractor
pub struct PathParameters<P>(pub P);

impl<S, P> FromRequestParts<S> for PathParameters<P>
where
    S: Send + Sync,
    P: DeserializeOwned + Send,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        parse_path(Path::<P>::from_request_parts(parts, state).await).map(PathParameters)
    }
}

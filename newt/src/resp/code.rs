pub use newt_msg::Code;

macro_rules! code {
  (#[doc = $doc:expr] $name:ident = $c:literal * $d:literal) => {
    #[doc = $doc]
    #[allow(clippy::zero_prefixed_literal)]
    pub const $name: Code = Code::new($c, $d);
  };
}

// 2.xx
code!(#[doc = "[2.01 Created](https://datatracker.ietf.org/doc/html/rfc7252#section-5.9.1.1)"]
      CREATED = 2*01);
code!(#[doc = "[2.02 Deleted](https://datatracker.ietf.org/doc/html/rfc7252#section-5.9.1.2)"]
      DELETED = 2*02);
code!(#[doc = "[2.03 Valid](https://datatracker.ietf.org/doc/html/rfc7252#section-5.9.1.3)"]
      VALID = 2*03);
code!(#[doc = "[2.04 Changed](https://datatracker.ietf.org/doc/html/rfc7252#section-5.9.1.4)"]
      CHANGED = 2*04);
code!(#[doc = "[2.05 Content](https://datatracker.ietf.org/doc/html/rfc7252#section-5.9.1.5)"]
      CONTENT = 2*05);

// 4.xx
code!(#[doc = "[4.00 Bad Request](https://datatracker.ietf.org/doc/html/rfc7252#section-5.9.2.1)"]
      BAD_REQUEST = 4*00);
code!(#[doc = "[4.01 Unauthorized](https://datatracker.ietf.org/doc/html/rfc7252#section-5.9.2.2)"]
      UNAUTHORIZED = 4*01);
code!(#[doc = "[4.02 Bad Option](https://datatracker.ietf.org/doc/html/rfc7252#section-5.9.2.3)"]
      BAD_OPTION = 4*02);
code!(#[doc = "[4.03 Forbidden](https://datatracker.ietf.org/doc/html/rfc7252#section-5.9.2.4)"]
      FORBIDDEN = 4*03);
code!(#[doc = "[4.04 Not Found](https://datatracker.ietf.org/doc/html/rfc7252#section-5.9.2.5)"]
      NOT_FOUND = 4*04);
code!(#[doc = "[4.05 Method Not Allowed](https://datatracker.ietf.org/doc/html/rfc7252#section-5.9.2.6)"]
      METHOD_NOT_ALLOWED = 4*05);
code!(#[doc = "[4.06 Not Acceptable](https://datatracker.ietf.org/doc/html/rfc7252#section-5.9.2.7)"]
      NOT_ACCEPTABLE = 4*06);
code!(#[doc = "[4.12 Precondition Failed](https://datatracker.ietf.org/doc/html/rfc7252#section-5.9.2.8)"]
      PRECONDITION_FAILED = 4*12);
code!(#[doc = "[4.13 Request Entity Too Large](https://datatracker.ietf.org/doc/html/rfc7252#section-5.9.2.9)"]
      REQUEST_ENTITY_TOO_LARGE = 4*13);
code!(#[doc = "[4.15 Unsupported Content-Format](https://datatracker.ietf.org/doc/html/rfc7252#section-5.9.2.10)"]
      UNSUPPORTED_CONTENT_FORMAT = 4*15);

// 5.xx
code!(#[doc = "[5.00 Internal Server Error](https://datatracker.ietf.org/doc/html/rfc7252#section-5.9.3.1)"]
      INTERNAL_SERVER_ERROR = 5*00);
code!(#[doc = "[5.01 Not Implemented](https://datatracker.ietf.org/doc/html/rfc7252#section-5.9.3.2)"]
      NOT_IMPLEMENTED = 5*01);
code!(#[doc = "[5.02 Bad Gateway](https://datatracker.ietf.org/doc/html/rfc7252#section-5.9.3.3)"]
      BAD_GATEWAY = 5*02);
code!(#[doc = "[5.03 Service Unavailable](https://datatracker.ietf.org/doc/html/rfc7252#section-5.9.3.4)"]
      SERVICE_UNAVAILABLE = 5*03);
code!(#[doc = "[5.04 Gateway Timeout](https://datatracker.ietf.org/doc/html/rfc7252#section-5.9.3.5)"]
      GATEWAY_TIMEOUT = 5*04);
code!(#[doc = "[5.05 Proxying Not Supported](https://datatracker.ietf.org/doc/html/rfc7252#section-5.9.3.6)"]
      PROXYING_NOT_SUPPORTED = 5*05);

/// The registered name of a code, used when rendering status lines.
pub fn name(code: Code) -> Option<&'static str> {
  match (code.class, code.detail) {
    | (0, 0) => Some("Empty"),
    | (0, 1) => Some("GET"),
    | (0, 2) => Some("POST"),
    | (0, 3) => Some("PUT"),
    | (0, 4) => Some("DELETE"),
    | (2, 1) => Some("Created"),
    | (2, 2) => Some("Deleted"),
    | (2, 3) => Some("Valid"),
    | (2, 4) => Some("Changed"),
    | (2, 5) => Some("Content"),
    | (4, 0) => Some("BadRequest"),
    | (4, 1) => Some("Unauthorized"),
    | (4, 2) => Some("BadOption"),
    | (4, 3) => Some("Forbidden"),
    | (4, 4) => Some("NotFound"),
    | (4, 5) => Some("MethodNotAllowed"),
    | (4, 6) => Some("NotAcceptable"),
    | (4, 12) => Some("PreconditionFailed"),
    | (4, 13) => Some("RequestEntityTooLarge"),
    | (4, 15) => Some("UnsupportedContentFormat"),
    | (5, 0) => Some("InternalServerError"),
    | (5, 1) => Some("NotImplemented"),
    | (5, 2) => Some("BadGateway"),
    | (5, 3) => Some("ServiceUnavailable"),
    | (5, 4) => Some("GatewayTimeout"),
    | (5, 5) => Some("ProxyingNotSupported"),
    | _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn consts_match_names() {
    assert_eq!(name(CONTENT), Some("Content"));
    assert_eq!(name(NOT_FOUND), Some("NotFound"));
    assert_eq!(name(GATEWAY_TIMEOUT), Some("GatewayTimeout"));
    assert_eq!(name(Code::new(7, 7)), None);
  }

  #[test]
  fn class_and_detail() {
    assert_eq!(CREATED.class, 2);
    assert_eq!(CREATED.detail, 1);
    assert_eq!(NOT_FOUND.class, 4);
    assert_eq!(NOT_FOUND.detail, 4);
  }
}

use chrono::{DateTime, Utc};
use rocket::http::{Cookie, CookieJar, SameSite};
use rocket::time::Duration;

/// Name of the browser cookie carrying the session id.
pub const SESSION_COOKIE_NAME: &str = "app_session";

/// Builds the session cookie. `Secure` is set only for production
/// deployments so local plaintext HTTP keeps working.
pub fn session_cookie(session_id: &str, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, session_id.to_owned()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(max_age_secs))
        .secure(secure)
        .build()
}

/// Cookie that makes the browser drop the session immediately.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::ZERO)
        .build()
}

/// Reads the session id presented by the request, if any. Absence is not
/// an error; it just means no session was presented.
pub fn session_id_from_jar(jar: &CookieJar<'_>) -> Option<String> {
    jar.get(SESSION_COOKIE_NAME).map(|cookie| cookie.value().to_string())
}

/// Seconds left until expiry, for the cookie `Max-Age`. Clamped at zero so
/// a record already past expiry never yields a negative attribute.
pub fn remaining_max_age(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (expires_at - now).num_seconds().max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SESSION_DURATION_SECS;
    use chrono::Duration as ChronoDuration;
    use proptest::prelude::*;

    #[test]
    fn issued_cookie_round_trips_through_wire_text() {
        let session_id = uuid::Uuid::now_v7().to_string();
        let cookie = session_cookie(&session_id, SESSION_DURATION_SECS, false);

        let parsed = Cookie::parse(cookie.to_string()).expect("cookie should parse");
        assert_eq!(parsed.name(), SESSION_COOKIE_NAME);
        assert_eq!(parsed.value(), session_id);
    }

    #[test]
    fn issued_cookie_carries_security_attributes() {
        let cookie = session_cookie("01ABC", SESSION_DURATION_SECS, false);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(SESSION_DURATION_SECS)));
        assert_ne!(cookie.secure(), Some(true));
    }

    #[test]
    fn secure_flag_only_in_production() {
        let cookie = session_cookie("01ABC", SESSION_DURATION_SECS, true);
        assert_eq!(cookie.secure(), Some(true));
    }

    #[test]
    fn removal_cookie_expires_immediately() {
        let cookie = removal_cookie();
        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }

    #[test]
    fn expired_record_yields_zero_max_age() {
        let now = Utc::now();
        assert_eq!(remaining_max_age(now - ChronoDuration::seconds(1), now), 0);
        assert_eq!(remaining_max_age(now + ChronoDuration::seconds(90), now), 90);
    }

    proptest! {
        #[test]
        fn max_age_is_never_negative(offset_secs in -2 * SESSION_DURATION_SECS..2 * SESSION_DURATION_SECS) {
            let now = Utc::now();
            let max_age = remaining_max_age(now + ChronoDuration::seconds(offset_secs), now);
            prop_assert!(max_age >= 0);
            prop_assert_eq!(max_age, offset_secs.max(0));
        }
    }
}

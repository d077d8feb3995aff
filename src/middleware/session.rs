use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use chrono::Utc;
use time::Duration;

pub const SESSION_COOKIE: &str = "visitor_session";

/// Cookie settings shared by every response that touches the session.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub hours: i64,
    pub secure: bool,
}

/// Store `<user id>:<issued unix seconds>` in the encrypted session cookie.
pub fn start_session(jar: PrivateCookieJar, user_id: i64, settings: SessionSettings) -> PrivateCookieJar {
    let value = format!("{user_id}:{}", Utc::now().timestamp());
    jar.add(build_cookie(value, settings))
}

pub fn end_session(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(clear_cookie())
}

/// User id carried by a session that has not outlived `settings.hours`.
pub fn session_user_id(jar: &PrivateCookieJar, settings: SessionSettings) -> Option<i64> {
    let cookie = jar.get(SESSION_COOKIE)?;
    let (id, issued) = cookie.value().split_once(':')?;
    let id: i64 = id.parse().ok()?;
    let issued: i64 = issued.parse().ok()?;
    let age = Utc::now().timestamp() - issued;
    (0..=settings.hours * 3600).contains(&age).then_some(id)
}

fn build_cookie(value: String, settings: SessionSettings) -> Cookie<'static> {
    Cookie::build(Cookie::new(SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(settings.secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::hours(settings.hours))
        .build()
}

fn clear_cookie() -> Cookie<'static> {
    Cookie::build(Cookie::new(SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Key;

    const SETTINGS: SessionSettings = SessionSettings {
        hours: 8,
        secure: false,
    };

    #[test]
    fn session_round_trips_through_the_private_jar() {
        let jar = start_session(PrivateCookieJar::new(Key::generate()), 7, SETTINGS);
        assert_eq!(session_user_id(&jar, SETTINGS), Some(7));
        let jar = end_session(jar);
        assert_eq!(session_user_id(&jar, SETTINGS), None);
    }

    #[test]
    fn stale_sessions_are_ignored() {
        let issued = Utc::now().timestamp() - 9 * 3600;
        let jar = PrivateCookieJar::new(Key::generate())
            .add(build_cookie(format!("7:{issued}"), SETTINGS));
        assert_eq!(session_user_id(&jar, SETTINGS), None);
    }
}

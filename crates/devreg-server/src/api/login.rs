/// Demo login. Timing and access logging happen in `timing::track_login`.
pub async fn login() -> &'static str {
    "Welcome to the Intro App!"
}

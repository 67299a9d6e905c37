use rocket::{http::Status, routes};

#[rocket::get("/health")]
pub async fn healthcheck() -> Status {
    Status::Ok
}

pub fn routes() -> Vec<rocket::Route> {
    routes![healthcheck]
}

#[cfg(test)]
mod tests {
    use rocket::http::Status;
    use rocket::local::asynchronous::Client;

    #[rocket::async_test]
    async fn health_check_works() {
        let rocket = rocket::build().mount("/api", super::routes());
        let client = Client::untracked(rocket).await.expect("valid rocket instance");

        let response = client.get("/api/health").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
    }
}

use liftoff::Config;
use rocket::{Build, Rocket};

#[rocket::launch]
fn rocket() -> Rocket<Build> {
    dotenvy::dotenv().ok();

    let config = Config::load().expect("failed to load configuration");
    liftoff::build_rocket(config)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    intern_certificate_server::run().await
}

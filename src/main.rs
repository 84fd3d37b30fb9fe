use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use synk_gateway::configuration::get_configuration;
use synk_gateway::startup::run;
use synk_gateway::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("starting gateway");

    let configuration = match get_configuration() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "configuration error",
            ));
        }
    };

    // Both signing secrets must be present, non-empty, and distinct.
    if let Err(e) = configuration.jwt.validate() {
        tracing::error!("invalid token signing configuration: {}", e);
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "configuration error",
        ));
    }

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "database connection error",
            )
        })?;

    let address = format!("127.0.0.1:{}", configuration.application.port);
    let listener = TcpListener::bind(&address)?;
    tracing::info!("listening on {}", address);

    let server = run(listener, pool, configuration.jwt.clone())?;
    server.await
}

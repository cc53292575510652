use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fleet_status::config::environment::EnvironmentConfig;
use fleet_status::database::create_pool;
use fleet_status::repositories::{InMemoryVehicleStore, PgVehicleStore, VehicleStore};
use fleet_status::routes::create_router;
use fleet_status::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();
    let config = EnvironmentConfig::from_env();

    // Configurar logging
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🚗 Fleet Status - reconciliación de estados de vehículos");
    info!("======================================================");

    let store: Arc<dyn VehicleStore> = match config.database_url.as_deref() {
        Some(url) => match create_pool(url).await {
            Ok(pool) => Arc::new(PgVehicleStore::new(pool)),
            Err(e) => {
                error!("❌ Error conectando a la base de datos: {}", e);
                return Err(anyhow::anyhow!("Error de base de datos: {}", e));
            }
        },
        None => {
            warn!("⚠️ DATABASE_URL no configurada, usando store en memoria vacío");
            Arc::new(InMemoryVehicleStore::new())
        }
    };

    let addr: SocketAddr = config.server_url().parse()?;
    info!("📝 Auditoría en {}", config.audit_log_dir.display());

    let state = AppState::new(config, store)?;
    let app = create_router(state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /api/vehicles - Listar flota");
    info!("   POST /api/vehicles/resolve - Resolver nombre");
    info!("   POST /api/status/validate | transition | name");
    info!("   POST /api/status/update - Actualización individual");
    info!("   POST /api/status/batch - Actualización por lote");
    info!("   GET  /api/audit/vehicle/:id | batch/:batch_id | stats");
    info!("   POST /api/audit/archive - Archivar entradas antiguas");
    info!("   GET  /metrics | /health");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Servidor terminó con error: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}

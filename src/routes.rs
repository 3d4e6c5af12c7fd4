use crate::{
    api::{attendance, report, task, time_log, user},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    // finish() only fails on a zero period or burst
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(web::resource("/me").route(web::get().to(handlers::me)))
            .service(
                web::scope("/time-logs")
                    .service(web::resource("/start").route(web::post().to(time_log::start)))
                    .service(web::resource("/stop").route(web::post().to(time_log::stop)))
                    .service(web::resource("/current").route(web::get().to(time_log::current)))
                    .service(web::resource("/daily").route(web::get().to(time_log::daily)))
                    // /time-logs/{id}/notes
                    .service(
                        web::resource("/{id}/notes")
                            .route(web::patch().to(time_log::update_notes)),
                    ),
            )
            .service(
                web::scope("/tasks")
                    // /tasks
                    .service(
                        web::resource("")
                            .route(web::get().to(task::list_tasks))
                            .route(web::post().to(task::create_task)),
                    )
                    // /tasks/{id}/status
                    .service(
                        web::resource("/{id}/status").route(web::patch().to(task::update_status)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(web::resource("").route(web::post().to(attendance::mark)))
                    .service(web::resource("/history").route(web::get().to(attendance::history)))
                    .service(web::resource("/latest").route(web::get().to(attendance::latest))),
            )
            .service(
                web::scope("/admin")
                    .service(
                        web::resource("/employee-status")
                            .route(web::get().to(report::employee_status)),
                    )
                    .service(
                        web::resource("/productivity-metrics")
                            .route(web::get().to(report::productivity_metrics)),
                    )
                    .service(
                        web::resource("/employee-time-logs")
                            .route(web::get().to(report::employee_time_logs)),
                    ),
            )
            .service(
                web::scope("/reports")
                    .service(
                        web::resource("/daily-summary/{employee_id}")
                            .route(web::get().to(report::daily_summary)),
                    )
                    .service(web::resource("/work-hours").route(web::get().to(report::work_hours)))
                    .service(web::resource("/tasks").route(web::get().to(report::tasks))),
            )
            .service(
                web::scope("/users")
                    .service(web::resource("").route(web::get().to(user::list_users)))
                    .service(
                        web::resource("/employees").route(web::get().to(user::list_employees)),
                    )
                    // /users/{id}/role
                    .service(web::resource("/{id}/role").route(web::patch().to(user::update_role))),
            ),
    );
}

// LOGIN
//  ├─ access_token (ACCESS_TOKEN_TTL)
//  └─ refresh_token (REFRESH_TOKEN_TTL)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns a new pair, the old refresh token is revoked

use crate::{
    api::{attendance, employee, report},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Per-route limiter. A zero rate is clamped to one request per minute.
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond((60_000 / requests_per_min as u64).max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst size are non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth").service(
            web::resource("/login")
                .wrap(login_limiter)
                .route(web::post().to(handlers::login)),
        ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(web::resource("/session").route(web::get().to(handlers::current_session)))
            .service(
                web::scope("/employee")
                    // /employee
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employee/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("")
                            .route(web::put().to(attendance::mark_attendance))
                            .route(web::get().to(attendance::list_attendance)),
                    )
                    // /attendance/bulk
                    .service(
                        web::resource("/bulk")
                            .route(web::post().to(attendance::bulk_mark_attendance)),
                    )
                    // /attendance/today
                    .service(
                        web::resource("/today").route(web::get().to(attendance::today_attendance)),
                    )
                    // /attendance/employee/{id}
                    .service(
                        web::resource("/employee/{id}")
                            .route(web::get().to(attendance::employee_history)),
                    )
                    // /attendance/employee/{id}/{date}
                    .service(
                        web::resource("/employee/{id}/{date}")
                            .route(web::get().to(attendance::entry_for_day)),
                    )
                    // /attendance/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::delete().to(attendance::delete_attendance)),
                    ),
            )
            .service(
                web::scope("/report")
                    // /report/dashboard
                    .service(
                        web::resource("/dashboard").route(web::get().to(report::dashboard)),
                    )
                    // /report/export/{kind}
                    .service(
                        web::resource("/export/{kind}")
                            .route(web::post().to(report::export_report)),
                    ),
            ),
    );
}

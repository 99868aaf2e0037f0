use crate::{
    api::{activity, attendance, employee, leave, performance, schedule, tracking},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    events,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

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
            .service(handlers::me)
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
                    // /attendance — clock in / clock out
                    .service(
                        web::resource("")
                            .route(web::post().to(attendance::clock_in))
                            .route(web::put().to(attendance::clock_out)),
                    )
                    // /attendance/records
                    .service(
                        web::resource("/records")
                            .route(web::get().to(attendance::list_attendance)),
                    )
                    // /attendance/absences
                    .service(
                        web::resource("/absences")
                            .route(web::post().to(attendance::mark_absences)),
                    )
                    // /attendance/{id} — admin correction
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(attendance::correct_attendance)),
                    ),
            )
            .service(
                web::scope("/schedule")
                    // /schedule
                    .service(web::resource("").route(web::get().to(schedule::month_schedule)))
                    // /schedule/override
                    .service(
                        web::resource("/override")
                            .route(web::post().to(schedule::upsert_override))
                            .route(web::get().to(schedule::list_overrides)),
                    )
                    // /schedule/override/{id}
                    .service(
                        web::resource("/override/{id}")
                            .route(web::delete().to(schedule::delete_override)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave::leave_list))
                            .route(web::post().to(leave::create_leave)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave::get_leave)))
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve").route(web::put().to(leave::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject").route(web::put().to(leave::reject_leave)),
                    ),
            )
            .service(
                web::scope("/tracking")
                    .service(web::resource("/ping").route(web::post().to(tracking::ping)))
                    .service(
                        web::resource("/live").route(web::get().to(tracking::live_positions)),
                    ),
            )
            .service(
                web::scope("/activity")
                    .service(web::resource("").route(web::get().to(activity::list_activity))),
            )
            .service(
                web::scope("/performance")
                    .service(
                        web::resource("").route(web::get().to(performance::month_performance)),
                    ),
            )
            .service(web::resource("/events").route(web::get().to(events::stream_events))),
    );
}

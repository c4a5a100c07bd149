use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
};

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the plank service.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::attempts::create_attempt,
        crate::routes::attempts::list_attempts,
        crate::routes::leaderboard::best_times,
        crate::routes::leaderboard::total_times,
        crate::routes::pages::dashboard,
        crate::routes::pages::dashboard_api,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::error::ErrorBody,
            crate::dto::auth::RegisterRequest,
            crate::dto::auth::RegisterResponse,
            crate::dto::auth::LoginRequest,
            crate::dto::auth::LoginResponse,
            crate::dto::auth::UserView,
            crate::dto::attempt::CreateAttemptRequest,
            crate::dto::attempt::CreateAttemptResponse,
            crate::dto::attempt::AttemptView,
            crate::dto::leaderboard::LeaderboardEntry,
            crate::dto::leaderboard::TotalTimeEntry,
            crate::dto::dashboard::DashboardResponse,
        )
    ),
    modifiers(&SessionSecurity),
    security(("bearer" = []), ("session_cookie" = [])),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and sessions"),
        (name = "attempts", description = "Logging and listing plank attempts"),
        (name = "leaderboard", description = "Rankings across users"),
        (name = "dashboard", description = "Personal overview"),
    )
)]
pub struct ApiDoc;

/// Register the two ways a session token can be presented.
struct SessionSecurity;

impl Modify for SessionSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(
                crate::routes::guard::SESSION_COOKIE,
            ))),
        );
    }
}

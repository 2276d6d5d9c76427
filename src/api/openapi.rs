//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, health, loans, users};
use crate::error::ErrorResponse;
use crate::models::{
    book::{Book, CreateBook},
    loan::Loan,
    user::{CreateUser, Role, User},
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stacks API",
        version = "0.1.0",
        description = "Library Circulation Tracker REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        // Books
        books::list_books,
        books::create_book,
        // Loans
        loans::checkout,
        loans::return_loan,
        loans::my_loans,
        loans::user_loans,
        // Users
        users::create_user,
        users::get_user,
    ),
    components(
        schemas(
            health::HealthResponse,
            auth::LoginRequest,
            auth::LoginResponse,
            loans::CheckoutRequest,
            Book,
            CreateBook,
            Loan,
            User,
            CreateUser,
            Role,
            ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health probes"),
        (name = "auth", description = "Authentication"),
        (name = "books", description = "Catalog management"),
        (name = "loans", description = "Checkout and return"),
        (name = "users", description = "User management")
    )
)]
pub struct ApiDoc;

/// Create the router serving the OpenAPI document and Swagger UI
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

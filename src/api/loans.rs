//! Loan (checkout/return) endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{error::AppResult, models::loan::Loan};

use super::AuthenticatedUser;

/// Checkout request
#[derive(Deserialize, ToSchema)]
pub struct CheckoutRequest {
    /// Book ID to check out
    pub book_id: i32,
}

/// Check a book out to the authenticated user
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Loan created", body = Loan),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book claimed by a concurrent checkout"),
        (status = 422, description = "Book is not available")
    )
)]
pub async fn checkout(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    let loan = state
        .services
        .circulation
        .checkout(request.book_id, &claims)
        .await?;

    Ok((StatusCode::CREATED, Json(loan)))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = Loan),
        (status = 403, description = "Not the borrower and not a librarian"),
        (status = 404, description = "Loan not found or already returned")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<Loan>> {
    let loan = state
        .services
        .circulation
        .return_loan(loan_id, &claims)
        .await?;

    Ok(Json(loan))
}

/// Get the authenticated user's open loans
#[utoipa::path(
    get,
    path = "/loans/me",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Open loans for the current user", body = Vec<Loan>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Loan>>> {
    let loans = state
        .services
        .circulation
        .open_loans_for(claims.user_id, &claims)
        .await?;

    Ok(Json(loans))
}

/// Get open loans for a specific user
#[utoipa::path(
    get,
    path = "/users/{id}/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User's open loans", body = Vec<Loan>),
        (status = 403, description = "Not the user itself and not a librarian"),
        (status = 404, description = "User not found")
    )
)]
pub async fn user_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<Loan>>> {
    let loans = state
        .services
        .circulation
        .open_loans_for(user_id, &claims)
        .await?;

    Ok(Json(loans))
}

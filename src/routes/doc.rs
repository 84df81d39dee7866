use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{SignInRequest, SignInResponse, SignUpRequest},
        favorites::AddFavoriteRequest,
        items::{CategoryTreeResponse, ItemFilter, ItemList, ItemRequest, ItemsQuery, SortDirection},
    },
    models::{Item, UserProfile},
    response::{ApiResponse, Meta},
    routes::{admin, auth, categories, favorites, health, items},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::sign_up,
        auth::sign_in,
        auth::me,
        items::query_items,
        items::get_item,
        items::create_item,
        items::edit_item,
        items::remove_item,
        items::upload_image,
        items::get_image,
        categories::category_tree,
        favorites::list_favorites,
        favorites::add_favorite,
        favorites::remove_favorite,
        admin::grant_admin
    ),
    components(
        schemas(
            Item,
            UserProfile,
            SignUpRequest,
            SignInRequest,
            SignInResponse,
            ItemRequest,
            ItemsQuery,
            ItemFilter,
            SortDirection,
            ItemList,
            CategoryTreeResponse,
            AddFavoriteRequest,
            items::ImageUpload,
            Meta,
            ApiResponse<Item>,
            ApiResponse<ItemList>,
            ApiResponse<UserProfile>,
            ApiResponse<SignInResponse>,
            ApiResponse<CategoryTreeResponse>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and sign-in"),
        (name = "Items", description = "Catalog queries, item management and images"),
        (name = "Categories", description = "Category tree"),
        (name = "Favorites", description = "Per-user favorite items"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

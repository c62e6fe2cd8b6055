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
        admin::{DashboardStats, ProductSummary},
        auth::{LoginRequest, LoginResponse},
        categories::{CategoryList, CategoryWithCount, CreateCategoryRequest, UpdateCategoryRequest},
        products::{
            CreateProductRequest, DeleteProductOutcome, ProductList, ProductWithCategory,
            UpdateProductRequest,
        },
        sales::{
            CheckoutItem, CheckoutRequest, CheckoutResponse, PeriodSalesStats, SaleLineDetail,
            SaleList, SaleWithLines, SalesStats, TopProduct,
        },
    },
    models::{Category, Product, Sale, SaleItem},
    response::{ApiResponse, Meta},
    routes::{admin, auth, categories, health, params, products, sales, search},
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
        auth::login,
        products::list_products,
        products::list_featured,
        products::get_product,
        search::search_products,
        categories::list_categories,
        categories::category_products,
        sales::checkout,
        admin::create_product,
        admin::update_product,
        admin::delete_product,
        admin::create_category,
        admin::update_category,
        admin::delete_category,
        admin::dashboard_stats,
        admin::list_sales,
        admin::sales_stats
    ),
    components(
        schemas(
            Product,
            Category,
            Sale,
            SaleItem,
            ProductWithCategory,
            ProductList,
            CreateProductRequest,
            UpdateProductRequest,
            DeleteProductOutcome,
            CategoryWithCount,
            CategoryList,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CheckoutItem,
            CheckoutRequest,
            CheckoutResponse,
            SaleLineDetail,
            SaleWithLines,
            SaleList,
            PeriodSalesStats,
            TopProduct,
            SalesStats,
            DashboardStats,
            ProductSummary,
            LoginRequest,
            LoginResponse,
            params::Pagination,
            params::ProductQuery,
            params::SaleListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CategoryList>,
            ApiResponse<CheckoutResponse>,
            ApiResponse<SaleList>,
            ApiResponse<DashboardStats>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Sales", description = "Checkout endpoint"),
        (name = "Admin", description = "Admin endpoints"),
        (name = "Auth", description = "Authentication endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

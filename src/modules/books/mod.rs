pub mod models;
pub mod pagination;
pub mod repository;
pub mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use repository::SharedBookRepository;
use routes::BooksState;

/// Virtual bookshelf: paginated listing, search, create, rate and delete
pub struct BooksModule {
    state: BooksState,
}

impl BooksModule {
    pub fn new(repository: SharedBookRepository) -> Self {
        Self {
            state: BooksState { repository },
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            driver = ?ctx.settings.database.driver,
            page_size = pagination::BOOKS_PER_SHELF,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let ok = |schema: &str| {
            json!({
                "description": "OK",
                "content": {
                    "application/json": {
                        "schema": { "$ref": format!("#/components/schemas/{}", schema) }
                    }
                }
            })
        };
        let page_param = json!({
            "name": "page",
            "in": "query",
            "required": false,
            "schema": { "type": "integer", "minimum": 1, "default": 1 }
        });
        let id_param = json!({
            "name": "book_id",
            "in": "path",
            "required": true,
            "schema": { "type": "integer" }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books, eight per page",
                        "tags": ["Books"],
                        "parameters": [
                            page_param,
                            {
                                "name": "search",
                                "in": "query",
                                "required": false,
                                "schema": { "type": "string" }
                            }
                        ],
                        "responses": {
                            "200": ok("BooksPage"),
                            "400": error("Invalid page"),
                            "404": error("Page out of range"),
                            "500": error("Internal server error")
                        }
                    },
                    "post": {
                        "summary": "Create a book, or search with {search}",
                        "tags": ["Books"],
                        "parameters": [page_param],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "oneOf": [
                                            { "$ref": "#/components/schemas/CreateBook" },
                                            { "$ref": "#/components/schemas/SearchBooks" }
                                        ]
                                    }
                                }
                            }
                        },
                        "responses": {
                            "200": ok("BookCreated"),
                            "400": error("Missing or malformed fields"),
                            "404": error("Search page out of range"),
                            "500": error("Internal server error")
                        }
                    }
                },
                "/{book_id}": {
                    "patch": {
                        "summary": "Update the rating of a book",
                        "tags": ["Books"],
                        "parameters": [id_param],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/UpdateRating" }
                                }
                            }
                        },
                        "responses": {
                            "200": ok("RatingUpdated"),
                            "400": error("Missing or malformed rating"),
                            "404": error("Unknown book"),
                            "500": error("Internal server error")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": [id_param, page_param],
                        "responses": {
                            "200": ok("BookDeleted"),
                            "404": error("Unknown book"),
                            "500": error("Internal server error")
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Books health check",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "OK",
                                "content": {
                                    "text/plain": { "schema": { "type": "string" } }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer" },
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "rating": { "type": "integer", "nullable": true }
                        },
                        "required": ["id", "title", "author", "rating"]
                    },
                    "CreateBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "rating": { "type": "integer", "nullable": true }
                        },
                        "required": ["title", "author"]
                    },
                    "SearchBooks": {
                        "type": "object",
                        "properties": { "search": { "type": "string" } },
                        "required": ["search"]
                    },
                    "UpdateRating": {
                        "type": "object",
                        "properties": { "rating": { "type": "integer" } },
                        "required": ["rating"]
                    },
                    "BooksPage": {
                        "type": "object",
                        "properties": {
                            "success": { "type": "boolean" },
                            "books": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } },
                            "total_books": { "type": "integer" }
                        }
                    },
                    "BookCreated": {
                        "type": "object",
                        "properties": {
                            "success": { "type": "boolean" },
                            "created_book_id": { "type": "integer" },
                            "books": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } },
                            "total_books": { "type": "integer" }
                        }
                    },
                    "RatingUpdated": {
                        "type": "object",
                        "properties": {
                            "success": { "type": "boolean" },
                            "updated_book_id": { "type": "integer" }
                        }
                    },
                    "BookDeleted": {
                        "type": "object",
                        "properties": {
                            "success": { "type": "boolean" },
                            "deleted_book_id": { "type": "integer" },
                            "books": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } },
                            "total_books": { "type": "integer" }
                        }
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            version: 1,
            description: "create books",
            up: r#"
                CREATE TABLE IF NOT EXISTS books (
                    id     SERIAL PRIMARY KEY,
                    title  TEXT NOT NULL,
                    author TEXT NOT NULL,
                    rating INTEGER
                );
                "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(repository: SharedBookRepository) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(repository))
}

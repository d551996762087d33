pub mod books;

use bookshelf_kernel::ModuleRegistry;

use crate::bootstrap::AppContext;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, ctx: &AppContext) {
    registry.register(books::create_module(ctx.books.clone()));
}

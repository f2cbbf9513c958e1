use maud::{DOCTYPE, Markup, html};

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

pub fn not_found_page() -> String {
    page(
        "Page Not Found",
        html! {
            div class="min-h-screen bg-gray-50 flex items-center justify-center" {
                div class="max-w-xl w-full px-6" {
                    div class="bg-white shadow rounded-lg p-8 text-center" {
                        p class="text-6xl font-bold text-gray-300" { "404" }
                        h1 class="mt-4 text-2xl font-bold text-gray-900" { "Page Not Found" }
                        p class="mt-2 text-gray-600" { "The page you were looking for does not exist." }
                        a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/" { "Home" }
                    }
                }
            }
        },
    )
}

pub fn error_page(message: &str) -> String {
    page(
        "Error",
        html! {
            div class="min-h-screen bg-gray-50 flex items-center justify-center" {
                div class="max-w-xl w-full px-6" {
                    div class="bg-white shadow rounded-lg p-8" {
                        h1 class="text-2xl font-bold text-gray-900" { "Error" }
                        p class="mt-4 text-gray-700" { (message) }
                        a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/" { "Back" }
                    }
                }
            }
        },
    )
}

fn page(title: &str, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                script src=(TAILWIND_CDN) {}
            }
            body { (body) }
        }
    }
    .into_string()
}

use crate::data::user::User;
use maud::{Markup, Render, html};

pub fn table<const N: usize>(
    overall_title: impl Render,
    titles: [&'static str; N],
    items: Vec<[Markup; N]>,
) -> Markup {
    html! {
        div class="container mx-auto" {
            (overall_title)
            div class="overflow-x-auto" {
                table class="min-w-full bg-gray-800 rounded shadow-md" {
                    thead class="bg-gray-700" {
                        tr {
                            @for title in titles {
                                th class="py-2 px-4 text-left font-semibold text-gray-300" {(title)}
                            }
                        }
                    }
                    tbody {
                        @for row in items {
                            tr {
                                @for col in row {
                                    td class="py-2 px-4 border-b border-gray-600 text-gray-200" {(col)}
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

pub fn title(s: impl Render) -> Markup {
    html! {
        h1 class="text-2xl font-semibold mb-4" {(s)}
    }
}

pub fn subtitle(s: impl Render) -> Markup {
    html! {
        h2 class="text-xl font-semibold mb-2" {(s)}
    }
}

pub fn form_element(id: &'static str, label: &'static str, input: Markup) -> Markup {
    html! {
        div class="mb-4" {
            label for=(id) class="block text-sm font-bold mb-2 text-gray-300" {(label)}
            (input)
        }
    }
}

pub fn simple_form_element(
    id: &'static str,
    label: &'static str,
    required: bool,
    ty: Option<&'static str>,
    value: Option<&str>,
) -> Markup {
    form_element(
        id,
        label,
        html! {
            input required[required] type=(ty.unwrap_or("text")) id=(id) name=(id) value=[value] class="shadow appearance-none border rounded w-full py-2 px-3 leading-tight focus:outline-none focus:shadow-outline bg-gray-700 border-gray-600";
        },
    )
}

pub fn form_submit_button(text: Option<&'static str>) -> Markup {
    html! {
        div class="flex items-center justify-between" {
            button type="submit" class="bg-blue-500 hover:bg-blue-700 font-bold py-2 px-4 rounded focus:outline-none focus:shadow-outline" {
                (text.unwrap_or("Submit"))
            }
        }
    }
}

pub fn errors_list<'a>(
    heading: Option<&'static str>,
    errors: impl Iterator<Item = &'a str>,
) -> Markup {
    html! {
        div role="alert" class="bg-red-100 border border-red-400 text-red-700 px-4 py-3 rounded relative mb-4" {
            strong class="font-bold" {(heading.unwrap_or("Please fix the following:"))}
            ul class="list-disc list-inside" {
                @for error in errors {
                    li {(error)}
                }
            }
        }
    }
}

/// Inline messages shown directly under a single form input.
pub fn field_errors<'a>(errors: impl Iterator<Item = &'a str>) -> Markup {
    html! {
        @for error in errors {
            p class="text-red-400 text-sm -mt-3 mb-4" {(error)}
        }
    }
}

pub fn render_nav(user: Option<&User>) -> Markup {
    html! {
        nav class="w-full bg-gray-800 shadow-md px-8 py-4 flex flex-row items-center justify-between" {
            div class="flex flex-row space-x-4 items-center" {
                a href="/students/" class="font-bold text-lg hover:text-blue-300" {"Roster"}
                @if user.is_some() {
                    a href="/students/create/" class="hover:text-blue-300" {"Add Student"}
                }
            }
            div class="flex flex-row space-x-4 items-center" {
                @if let Some(user) = user {
                    span class="text-gray-400" {(user.email)}
                    form method="post" action="/logout" {
                        button type="submit" class="bg-slate-600 hover:bg-slate-800 font-bold py-1 px-3 rounded" {"Logout"}
                    }
                } @else {
                    a href="/login" class="bg-slate-600 hover:bg-slate-800 font-bold py-1 px-3 rounded" {"Login"}
                }
            }
        }
    }
}

pub mod downstream;
pub mod movie_details;
pub mod movie_search;
pub mod user_genres;

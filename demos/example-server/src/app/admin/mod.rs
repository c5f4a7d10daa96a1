pub mod stats_controller;

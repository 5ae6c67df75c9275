//! Test modules for the broadcast system

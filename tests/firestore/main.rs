mod model;
mod queries;
mod references;
mod rest;
